use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

/// Stored in place of an empty or missing text label after normalisation.
pub const MISSING_LABEL: &str = "nan";

// ---------------------------------------------------------------------------
// LabelColumn – the filterable text classification columns
// ---------------------------------------------------------------------------

/// A text column the user can filter on by exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabelColumn {
    Category,
    Merchant,
    PaymentMethod,
    AccountType,
}

impl LabelColumn {
    pub const ALL: [LabelColumn; 4] = [
        LabelColumn::Category,
        LabelColumn::Merchant,
        LabelColumn::PaymentMethod,
        LabelColumn::AccountType,
    ];

    /// Header name of the column in the source file.
    pub fn field_name(self) -> &'static str {
        match self {
            LabelColumn::Category => "category",
            LabelColumn::Merchant => "merchant",
            LabelColumn::PaymentMethod => "payment_method",
            LabelColumn::AccountType => "account_type",
        }
    }
}

impl fmt::Display for LabelColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LabelColumn::Category => "Category",
            LabelColumn::Merchant => "Merchant",
            LabelColumn::PaymentMethod => "Payment Method",
            LabelColumn::AccountType => "Account Type",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Transaction – one row of the source file
// ---------------------------------------------------------------------------

/// A single loaded transaction. Calendar fields are derived from `date` by
/// [`Transaction::new`] and never set independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub date: NaiveDateTime,
    pub amount: f64,
    pub category: String,
    pub merchant: String,
    pub payment_method: String,
    pub account_type: String,
    pub transaction_type: String,
    pub description: String,

    pub date_only: NaiveDate,
    pub year: i32,
    /// First day of the transaction's month.
    pub month: NaiveDate,
    /// English day name, e.g. `"Monday"`.
    pub weekday: String,
    pub hour: u32,
}

/// Source fields of a transaction, before calendar derivation.
#[derive(Debug, Clone, Default)]
pub struct RawFields {
    pub transaction_id: String,
    pub amount: f64,
    pub category: String,
    pub merchant: String,
    pub payment_method: String,
    pub account_type: String,
    pub transaction_type: String,
    pub description: String,
}

impl Transaction {
    pub fn new(date: NaiveDateTime, fields: RawFields) -> Self {
        let date_only = date.date();
        Self {
            transaction_id: fields.transaction_id,
            date,
            amount: fields.amount,
            category: fields.category,
            merchant: fields.merchant,
            payment_method: fields.payment_method,
            account_type: fields.account_type,
            transaction_type: fields.transaction_type,
            description: fields.description,
            date_only,
            year: date_only.year(),
            month: date_only.with_day(1).unwrap_or(date_only),
            weekday: date_only.format("%A").to_string(),
            hour: date.hour(),
        }
    }

    pub fn label(&self, column: LabelColumn) -> &str {
        match column {
            LabelColumn::Category => &self.category,
            LabelColumn::Merchant => &self.merchant,
            LabelColumn::PaymentMethod => &self.payment_method,
            LabelColumn::AccountType => &self.account_type,
        }
    }

    /// Day of week with Monday = 0 … Sunday = 6.
    pub fn weekday_number(&self) -> usize {
        self.date_only.weekday().num_days_from_monday() as usize
    }
}

// ---------------------------------------------------------------------------
// Dataset – an ordered collection of transactions
// ---------------------------------------------------------------------------

/// Transactions plus pre-computed distinct label values for the filter widgets.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub transactions: Vec<Transaction>,
    /// For each label column the sorted set of distinct values.
    pub unique_values: BTreeMap<LabelColumn, BTreeSet<String>>,
    /// Rows skipped at load time because their date or amount could not be
    /// parsed.
    pub dropped_rows: usize,
}

impl Dataset {
    /// Build label indices from the given transactions.
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        let mut unique_values: BTreeMap<LabelColumn, BTreeSet<String>> = LabelColumn::ALL
            .iter()
            .map(|&col| (col, BTreeSet::new()))
            .collect();

        for tx in &transactions {
            for col in LabelColumn::ALL {
                unique_values
                    .entry(col)
                    .or_default()
                    .insert(tx.label(col).to_string());
            }
        }

        Dataset {
            transactions,
            unique_values,
            dropped_rows: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Distinct values of one label column, sorted.
    pub fn values(&self, column: LabelColumn) -> impl Iterator<Item = &str> {
        self.unique_values
            .get(&column)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn distinct_count(&self, column: LabelColumn) -> usize {
        self.unique_values.get(&column).map_or(0, BTreeSet::len)
    }

    /// Earliest and latest calendar day present, if any.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.transactions.iter().map(|t| t.date_only).min()?;
        let max = self.transactions.iter().map(|t| t.date_only).max()?;
        Some((min, max))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tx(id: &str, date: &str, amount: f64, category: &str, merchant: &str) -> Transaction {
        let date = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap();
        Transaction::new(
            date,
            RawFields {
                transaction_id: id.to_string(),
                amount,
                category: category.to_string(),
                merchant: merchant.to_string(),
                payment_method: "Card".to_string(),
                account_type: "Checking".to_string(),
                transaction_type: "debit".to_string(),
                description: String::new(),
            },
        )
    }

    #[test]
    fn derived_calendar_fields_follow_date() {
        let t = tx("1", "2024-03-17 14:05:00", 12.5, "Food", "Cafe");
        assert_eq!(t.date_only, NaiveDate::from_ymd_opt(2024, 3, 17).unwrap());
        assert_eq!(t.year, 2024);
        assert_eq!(t.month, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(t.weekday, "Sunday");
        assert_eq!(t.weekday_number(), 6);
        assert_eq!(t.hour, 14);
    }

    #[test]
    fn dataset_indexes_distinct_labels() {
        let ds = Dataset::from_transactions(vec![
            tx("1", "2024-01-01 10:00:00", 1.0, "Food", "Cafe"),
            tx("1", "2024-01-02 10:00:00", 2.0, "Food", "Bakery"),
            tx("3", "2024-01-05 10:00:00", 3.0, "Travel", "Cafe"),
        ]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.distinct_count(LabelColumn::Category), 2);
        assert_eq!(
            ds.values(LabelColumn::Merchant).collect::<Vec<_>>(),
            vec!["Bakery", "Cafe"]
        );
        assert_eq!(
            ds.date_bounds(),
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
            ))
        );
    }

    #[test]
    fn empty_dataset_has_no_bounds() {
        let ds = Dataset::from_transactions(Vec::new());
        assert!(ds.is_empty());
        assert_eq!(ds.date_bounds(), None);
        assert_eq!(ds.distinct_count(LabelColumn::AccountType), 0);
    }
}
