use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{LabelColumn, Transaction};

pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelTotal {
    pub label: String,
    pub amount: f64,
}

/// Summed amount per (weekday, hour); row 0 is Monday, column 0 is 00:00.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeekdayHourMatrix {
    pub cells: [[f64; 24]; 7],
}

impl Default for WeekdayHourMatrix {
    fn default() -> Self {
        Self {
            cells: [[0.0; 24]; 7],
        }
    }
}

impl WeekdayHourMatrix {
    pub fn get(&self, weekday: usize, hour: usize) -> f64 {
        self.cells[weekday][hour]
    }

    /// Smallest and largest cell value.
    pub fn range(&self) -> (f64, f64) {
        self.cells
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_amount: f64,
    pub transaction_count: usize,
    pub average_amount: f64,
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

pub fn kpis(transactions: &[Transaction]) -> Kpis {
    if transactions.is_empty() {
        return Kpis::default();
    }
    let total_amount: f64 = transactions.iter().map(|t| t.amount).sum();
    Kpis {
        total_amount,
        transaction_count: transactions.len(),
        average_amount: total_amount / transactions.len() as f64,
    }
}

/// One row per day that has data, ordered by date. Missing days are not filled.
pub fn daily_totals(transactions: &[Transaction]) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for t in transactions {
        *by_day.entry(t.date_only).or_default() += t.amount;
    }
    by_day
        .into_iter()
        .map(|(date, amount)| DailyTotal { date, amount })
        .collect()
}

/// Sum of `amount` per distinct label, ordered by label.
pub fn label_totals(transactions: &[Transaction], column: LabelColumn) -> Vec<LabelTotal> {
    let mut by_label: BTreeMap<&str, f64> = BTreeMap::new();
    for t in transactions {
        *by_label.entry(t.label(column)).or_default() += t.amount;
    }
    by_label
        .into_iter()
        .map(|(label, amount)| LabelTotal {
            label: label.to_string(),
            amount,
        })
        .collect()
}

pub fn category_totals(transactions: &[Transaction]) -> Vec<LabelTotal> {
    label_totals(transactions, LabelColumn::Category)
}

pub fn merchant_totals(transactions: &[Transaction]) -> Vec<LabelTotal> {
    label_totals(transactions, LabelColumn::Merchant)
}

pub fn payment_method_totals(transactions: &[Transaction]) -> Vec<LabelTotal> {
    label_totals(transactions, LabelColumn::PaymentMethod)
}

/// Largest total first; ties keep label order.
pub fn sort_by_total_desc(totals: &mut [LabelTotal]) {
    totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
}

/// Keep the first `n` rows as given (at least one). Sort beforehand if
/// "top" should mean "largest".
pub fn top_n(mut totals: Vec<LabelTotal>, n: usize) -> Vec<LabelTotal> {
    totals.truncate(n.max(1));
    totals
}

/// First `n` merchant totals in label order.
pub fn top_merchants(transactions: &[Transaction], n: usize) -> Vec<LabelTotal> {
    top_n(merchant_totals(transactions), n)
}

/// Dense 7×24 matrix; combinations with no data stay at zero.
pub fn weekday_hour_matrix(transactions: &[Transaction]) -> WeekdayHourMatrix {
    let mut matrix = WeekdayHourMatrix::default();
    for t in transactions {
        let hour = (t.hour as usize).min(23);
        matrix.cells[t.weekday_number()][hour] += t.amount;
    }
    matrix
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Every chart-ready table for one filtered view, serialisable as JSON.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub kpis: Kpis,
    pub daily_totals: Vec<DailyTotal>,
    pub category_totals: Vec<LabelTotal>,
    pub merchant_totals: Vec<LabelTotal>,
    pub payment_method_totals: Vec<LabelTotal>,
    pub weekday_hour: WeekdayHourMatrix,
    pub outlier_count: usize,
}

impl DashboardSummary {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
