use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::error::LoadError;
use super::model::{Dataset, RawFields, Transaction, MISSING_LABEL};

/// Columns every input file must provide. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "transaction_id",
    "date",
    "amount",
    "category",
    "merchant",
    "payment_method",
    "account_type",
    "transaction_type",
    "description",
];

/// Naive timestamp layouts tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// Date-only layouts, interpreted as midnight.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%Y%m%d",
];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a transactions CSV from disk.
pub fn load_csv(path: &Path) -> Result<Dataset, LoadError> {
    let file = std::fs::File::open(path)?;
    let dataset = load_reader(file)?;
    log::info!(
        "Loaded {} transactions from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

/// Load transactions from any CSV byte stream with a header row.
///
/// Rows whose `date` or `amount` cannot be parsed are skipped and counted in
/// [`Dataset::dropped_rows`].
pub fn load_reader<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::Schema { missing });
    }

    // Every required column is present, so each lookup resolves.
    let idx = |name: &str| headers.iter().position(|h| h == name).unwrap_or_default();
    let columns = ColumnIndex {
        transaction_id: idx("transaction_id"),
        date: idx("date"),
        amount: idx("amount"),
        category: idx("category"),
        merchant: idx("merchant"),
        payment_method: idx("payment_method"),
        account_type: idx("account_type"),
        transaction_type: idx("transaction_type"),
        description: idx("description"),
    };

    let mut transactions = Vec::new();
    let mut bad_dates = 0usize;
    let mut bad_amounts = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let Some(date) = parse_datetime(cell(columns.date)) else {
            log::debug!("Row {}: unparseable date '{}'", row_no + 1, cell(columns.date));
            bad_dates += 1;
            continue;
        };

        let Some(amount) = parse_amount(cell(columns.amount)) else {
            log::debug!("Row {}: unparseable amount '{}'", row_no + 1, cell(columns.amount));
            bad_amounts += 1;
            continue;
        };

        let fields = RawFields {
            transaction_id: cell(columns.transaction_id).to_string(),
            amount,
            category: normalize_label(cell(columns.category)),
            merchant: normalize_label(cell(columns.merchant)),
            payment_method: normalize_label(cell(columns.payment_method)),
            account_type: normalize_label(cell(columns.account_type)),
            transaction_type: normalize_label(cell(columns.transaction_type)),
            description: cell(columns.description).to_string(),
        };
        transactions.push(Transaction::new(date, fields));
    }

    if bad_dates > 0 {
        log::warn!("Dropped {bad_dates} rows with unparseable dates");
    }
    if bad_amounts > 0 {
        log::warn!("Dropped {bad_amounts} rows with missing or unparseable amounts");
    }

    let mut dataset = Dataset::from_transactions(transactions);
    dataset.dropped_rows = bad_dates + bad_amounts;
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Field normalisation
// ---------------------------------------------------------------------------

struct ColumnIndex {
    transaction_id: usize,
    date: usize,
    amount: usize,
    category: usize,
    merchant: usize,
    payment_method: usize,
    account_type: usize,
    transaction_type: usize,
    description: usize,
}

/// An absent or empty cell becomes [`MISSING_LABEL`]; anything else is
/// trimmed, so a whitespace-only cell ends up as an empty label.
fn normalize_label(s: &str) -> String {
    if s.is_empty() {
        MISSING_LABEL.to_string()
    } else {
        s.trim().to_string()
    }
}

fn parse_amount(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Best-effort timestamp parsing. Offset-aware values keep their wall-clock
/// time; date-only values land on midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
