use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use super::model::{Dataset, LabelColumn, Transaction};

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// Calendar-day range. Both ends are inclusive: `end` covers its whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `start 00:00 <= t < (end + 1 day) 00:00`
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        let lower = self.start.and_time(NaiveTime::MIN);
        match self.end.checked_add_days(Days::new(1)) {
            Some(next) => t >= lower && t < next.and_time(NaiveTime::MIN),
            None => t >= lower,
        }
    }
}

/// The user's current selections. An unset range or an empty value set
/// means "no restriction" for that predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub date_range: Option<DateRange>,
    pub categories: BTreeSet<String>,
    pub merchants: BTreeSet<String>,
    pub payment_methods: BTreeSet<String>,
    pub account_types: BTreeSet<String>,
}

impl FilterSelection {
    pub fn allowed(&self, column: LabelColumn) -> &BTreeSet<String> {
        match column {
            LabelColumn::Category => &self.categories,
            LabelColumn::Merchant => &self.merchants,
            LabelColumn::PaymentMethod => &self.payment_methods,
            LabelColumn::AccountType => &self.account_types,
        }
    }

    pub fn allowed_mut(&mut self, column: LabelColumn) -> &mut BTreeSet<String> {
        match column {
            LabelColumn::Category => &mut self.categories,
            LabelColumn::Merchant => &mut self.merchants,
            LabelColumn::PaymentMethod => &mut self.payment_methods,
            LabelColumn::AccountType => &mut self.account_types,
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.date_range.is_none()
            && LabelColumn::ALL
                .iter()
                .all(|&col| self.allowed(col).is_empty())
    }

    /// Whether a single transaction passes every active predicate.
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(range) = &self.date_range {
            if !range.contains(tx.date) {
                return false;
            }
        }
        LabelColumn::ALL.iter().all(|&col| {
            let allowed = self.allowed(col);
            allowed.is_empty() || allowed.contains(tx.label(col))
        })
    }
}

// ---------------------------------------------------------------------------
// Applying a selection
// ---------------------------------------------------------------------------

/// Return indices of transactions that pass all active filters, in order.
pub fn filtered_indices(dataset: &Dataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .transactions
        .iter()
        .enumerate()
        .filter(|(_, tx)| selection.matches(tx))
        .map(|(i, _)| i)
        .collect()
}

/// Build a new dataset holding only the matching transactions. The input is
/// left untouched.
pub fn apply_filters(dataset: &Dataset, selection: &FilterSelection) -> Dataset {
    if selection.is_unconstrained() {
        return dataset.clone();
    }
    let transactions = filtered_indices(dataset, selection)
        .into_iter()
        .map(|i| dataset.transactions[i].clone())
        .collect();
    let mut filtered = Dataset::from_transactions(transactions);
    filtered.dropped_rows = dataset.dropped_rows;
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::tx;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Dataset {
        Dataset::from_transactions(vec![
            tx("1", "2024-01-01 00:00:00", 10.0, "Food", "Cafe"),
            tx("2", "2024-01-01 23:59:00", 20.0, "Food", "Bakery"),
            tx("3", "2024-01-02 00:00:01", 30.0, "Travel", "Airline"),
            tx("4", "2023-12-31 23:59:59", 40.0, "Travel", "Cafe"),
        ])
    }

    fn ids(ds: &Dataset) -> Vec<&str> {
        ds.transactions.iter().map(|t| t.transaction_id.as_str()).collect()
    }

    #[test]
    fn end_date_is_fully_included() {
        let ds = sample();
        let selection = FilterSelection {
            date_range: Some(DateRange::new(day(2024, 1, 1), day(2024, 1, 1))),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&ds, &selection)), vec!["1", "2"]);
    }

    #[test]
    fn empty_selection_returns_identical_dataset() {
        let ds = sample();
        let out = apply_filters(&ds, &FilterSelection::default());
        assert_eq!(out.transactions, ds.transactions);
    }

    #[test]
    fn label_predicates_combine_with_and() {
        let ds = sample();
        let mut selection = FilterSelection::default();
        selection.categories.insert("Travel".into());
        selection.merchants.insert("Cafe".into());
        assert_eq!(ids(&apply_filters(&ds, &selection)), vec!["4"]);

        selection.merchants.insert("Airline".into());
        assert_eq!(ids(&apply_filters(&ds, &selection)), vec!["3", "4"]);
    }

    #[test]
    fn membership_is_case_sensitive() {
        let ds = sample();
        let mut selection = FilterSelection::default();
        selection.categories.insert("food".into());
        assert!(apply_filters(&ds, &selection).is_empty());
    }

    #[test]
    fn every_result_satisfies_selection_and_is_a_subset() {
        let ds = sample();
        let mut selection = FilterSelection {
            date_range: Some(DateRange::new(day(2023, 12, 31), day(2024, 1, 1))),
            ..Default::default()
        };
        selection.merchants.insert("Cafe".into());
        let out = apply_filters(&ds, &selection);
        assert_eq!(ids(&out), vec!["1", "4"]);
        for t in &out.transactions {
            assert!(selection.matches(t));
            assert!(ds.transactions.contains(t));
        }
        // Input is untouched.
        assert_eq!(ds.len(), 4);
    }

    #[test]
    fn filtered_dataset_reindexes_labels() {
        let ds = sample();
        let mut selection = FilterSelection::default();
        selection.categories.insert("Food".into());
        let out = apply_filters(&ds, &selection);
        assert_eq!(
            out.values(LabelColumn::Merchant).collect::<Vec<_>>(),
            vec!["Bakery", "Cafe"]
        );
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let ds = sample();
        let selection = FilterSelection {
            date_range: Some(DateRange::new(day(2024, 2, 1), day(2024, 1, 1))),
            ..Default::default()
        };
        assert!(filtered_indices(&ds, &selection).is_empty());
    }
}
