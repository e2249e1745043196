use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::aggregate::{
    self, DailyTotal, DashboardSummary, Kpis, LabelTotal, WeekdayHourMatrix,
};
use crate::data::cache::DatasetCache;
use crate::data::filter::{DateRange, FilterSelection, apply_filters};
use crate::data::model::{Dataset, LabelColumn};
use crate::data::outliers::{FlaggedTransaction, OutlierConfig, detect_outliers};

const THRESHOLD_SLIDER_MIN: f64 = 2.0;
const THRESHOLD_SLIDER_MAX: f64 = 5.0;

// ---------------------------------------------------------------------------
// Derived views – everything the charts read, recomputed per interaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct DashboardViews {
    pub filtered: Dataset,
    pub kpis: Kpis,
    pub daily: Vec<DailyTotal>,
    /// Largest total first.
    pub categories: Vec<LabelTotal>,
    /// Largest total first.
    pub merchants: Vec<LabelTotal>,
    pub top_merchants: Vec<LabelTotal>,
    pub payment_methods: Vec<LabelTotal>,
    pub heatmap: WeekdayHourMatrix,
    pub flagged: Vec<FlaggedTransaction>,
}

impl DashboardViews {
    pub fn compute(
        dataset: &Dataset,
        selection: &FilterSelection,
        outlier: &OutlierConfig,
        top_n: usize,
    ) -> Self {
        let filtered = apply_filters(dataset, selection);
        let txs = &filtered.transactions;

        let mut categories = aggregate::category_totals(txs);
        aggregate::sort_by_total_desc(&mut categories);
        let mut merchants = aggregate::merchant_totals(txs);
        aggregate::sort_by_total_desc(&mut merchants);
        let top_merchants = if merchants.is_empty() {
            Vec::new()
        } else {
            aggregate::top_n(merchants.clone(), top_n)
        };

        Self {
            kpis: aggregate::kpis(txs),
            daily: aggregate::daily_totals(txs),
            categories,
            merchants,
            top_merchants,
            payment_methods: aggregate::payment_method_totals(txs),
            heatmap: aggregate::weekday_hour_matrix(txs),
            flagged: detect_outliers(txs, outlier),
            filtered,
        }
    }

    pub fn outlier_count(&self) -> usize {
        self.flagged.iter().filter(|f| f.is_outlier).count()
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            kpis: self.kpis,
            daily_totals: self.daily.clone(),
            category_totals: self.categories.clone(),
            merchant_totals: self.merchants.clone(),
            payment_method_totals: self.payment_methods.clone(),
            weekday_hour: self.heatmap,
            outlier_count: self.outlier_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    cache: DatasetCache,

    /// File the current dataset came from.
    pub source_path: Option<PathBuf>,

    /// Loaded dataset (None until a file is opened).
    pub dataset: Option<Arc<Dataset>>,

    pub selection: FilterSelection,
    pub outlier: OutlierConfig,

    /// Requested merchant count; see [`AppState::effective_top_n`].
    pub top_n_merchants: usize,

    pub views: DashboardViews,

    /// Stable colours per category / payment method for the loaded dataset.
    pub category_colors: Option<ColorMap>,
    pub payment_colors: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            cache: DatasetCache::new(),
            source_path: None,
            dataset: None,
            selection: FilterSelection::default(),
            outlier: config.outlier,
            top_n_merchants: config.top_n_merchants,
            views: DashboardViews::default(),
            category_colors: None,
            payment_colors: None,
            status_message: None,
        }
    }

    /// Load (or fetch from cache) the file at `path` and make it current.
    /// Errors are reported through `status_message` as well as returned.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        match self.cache.get_or_load(path) {
            Ok(dataset) => {
                log::info!(
                    "Opened {} ({} transactions, {} dropped, {} file(s) cached)",
                    path.display(),
                    dataset.len(),
                    dataset.dropped_rows,
                    self.cache.len()
                );
                self.set_dataset(dataset, path.to_path_buf());
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                Err(e).with_context(|| format!("loading {}", path.display()))
            }
        }
    }

    /// Ingest a newly loaded dataset and reset the filters to cover it.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>, path: PathBuf) {
        self.selection = FilterSelection {
            date_range: dataset
                .date_bounds()
                .map(|(start, end)| DateRange::new(start, end)),
            ..Default::default()
        };
        self.category_colors = Some(ColorMap::new(dataset.values(LabelColumn::Category)));
        self.payment_colors = Some(ColorMap::new(dataset.values(LabelColumn::PaymentMethod)));
        self.dataset = Some(dataset);
        self.source_path = Some(path);
        self.status_message = None;
        self.recompute();
    }

    /// Reload the current file if it changed on disk. Returns whether a
    /// reload happened.
    pub fn reload_if_changed(&mut self) -> Result<bool> {
        let Some(path) = self.source_path.clone() else {
            return Ok(false);
        };
        if self.cache.is_fresh(&path) {
            return Ok(false);
        }
        let selection = self.selection.clone();
        self.open(&path)?;
        // Keep label choices across a reload; the date range follows the new data.
        self.selection.categories = selection.categories;
        self.selection.merchants = selection.merchants;
        self.selection.payment_methods = selection.payment_methods;
        self.selection.account_types = selection.account_types;
        self.recompute();
        Ok(true)
    }

    /// Drop the cached copy and read the current file again.
    pub fn force_reload(&mut self) -> Result<()> {
        let Some(path) = self.source_path.clone() else {
            return Ok(());
        };
        self.cache.invalidate(&path);
        self.open(&path)
    }

    /// Re-run filter → aggregate/detect over the current dataset.
    pub fn recompute(&mut self) {
        self.views = match &self.dataset {
            Some(ds) => DashboardViews::compute(
                ds,
                &self.selection,
                &self.outlier,
                self.top_n_merchants,
            ),
            None => DashboardViews::default(),
        };
    }

    /// Requested top-N clamped to `1..=distinct merchants` of the filtered set.
    pub fn effective_top_n(&self) -> usize {
        self.top_n_merchants.clamp(1, self.max_top_n())
    }

    pub fn max_top_n(&self) -> usize {
        self.views
            .filtered
            .distinct_count(LabelColumn::Merchant)
            .max(1)
    }

    pub fn set_top_n(&mut self, n: usize) {
        self.top_n_merchants = n.max(1);
        self.recompute();
    }

    /// Slider bounds for the z-score threshold: the usual 2.0–5.0, widened to
    /// include a configured value outside it so the slider never snaps it.
    pub fn threshold_slider_range(&self) -> RangeInclusive<f64> {
        let current = self.outlier.zscore_threshold;
        current.min(THRESHOLD_SLIDER_MIN)..=current.max(THRESHOLD_SLIDER_MAX)
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        if threshold.is_finite() && threshold > 0.0 {
            self.outlier.zscore_threshold = threshold;
            self.recompute();
        }
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.selection.date_range = Some(DateRange::new(start, end));
        self.recompute();
    }

    /// Toggle a single label value in a column's selection.
    pub fn toggle_label(&mut self, column: LabelColumn, value: &str) {
        let selected = self.selection.allowed_mut(column);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.recompute();
    }

    /// Drop every constraint on one column.
    pub fn clear_column(&mut self, column: LabelColumn) {
        self.selection.allowed_mut(column).clear();
        self.recompute();
    }

    /// Back to the dataset's full date range with no label constraints.
    pub fn reset_filters(&mut self) {
        if let Some(ds) = self.dataset.clone() {
            let path = self.source_path.clone().unwrap_or_default();
            self.set_dataset(ds, path);
        }
    }

    /// Write the current view's tables as pretty JSON.
    pub fn export_summary(&self, path: &Path) -> Result<()> {
        let json = self
            .views
            .summary()
            .to_json_pretty()
            .context("serialising summary")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported summary to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CSV: &str = "\
transaction_id,date,amount,category,merchant,payment_method,account_type,transaction_type,description
T1,2024-01-01 09:00:00,10,Food,Cafe,Card,Checking,debit,
T2,2024-01-02 12:00:00,20,Food,Bakery,Cash,Checking,debit,
T3,2024-01-03 18:00:00,300,Travel,Airline,Card,Savings,debit,
T4,garbage,5,Food,Cafe,Card,Checking,debit,
T5,2024-01-02 13:00:00,,Food,Cafe,Card,Checking,debit,
";

    fn opened() -> (tempfile::NamedTempFile, AppState) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let mut state = AppState::new(&DashboardConfig::default());
        state.open(file.path()).unwrap();
        (file, state)
    }

    #[test]
    fn opening_initialises_range_and_views() {
        let (_file, state) = opened();
        let range = state.selection.date_range.unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(state.views.kpis.transaction_count, 3);
        assert_eq!(state.dataset.as_ref().unwrap().dropped_rows, 2);
        assert_eq!(state.views.categories[0].label, "Travel");
        assert_eq!(state.views.top_merchants.len(), 3);
    }

    #[test]
    fn toggling_labels_narrows_and_restores() {
        let (_file, mut state) = opened();
        state.toggle_label(LabelColumn::Category, "Food");
        assert_eq!(state.views.kpis.transaction_count, 2);
        assert_eq!(state.views.kpis.total_amount, 30.0);

        state.toggle_label(LabelColumn::Category, "Food");
        assert_eq!(state.views.kpis.transaction_count, 3);

        state.toggle_label(LabelColumn::PaymentMethod, "Cash");
        assert_eq!(state.views.kpis.transaction_count, 1);
        state.clear_column(LabelColumn::PaymentMethod);
        assert_eq!(state.views.kpis.transaction_count, 3);
    }

    #[test]
    fn top_n_is_clamped_to_distinct_merchants() {
        let (_file, mut state) = opened();
        assert_eq!(state.effective_top_n(), 3);
        state.set_top_n(1);
        assert_eq!(state.views.top_merchants.len(), 1);
        assert_eq!(state.views.top_merchants[0].label, "Airline");
        state.set_top_n(0);
        assert_eq!(state.top_n_merchants, 1);
    }

    #[test]
    fn threshold_changes_flags() {
        let (_file, mut state) = opened();
        assert_eq!(state.views.outlier_count(), 0);
        state.set_threshold(1.0);
        assert_eq!(state.views.outlier_count(), 1);
        state.set_threshold(-2.0);
        assert_eq!(state.outlier.zscore_threshold, 1.0);
    }

    #[test]
    fn slider_range_keeps_configured_threshold() {
        let mut config = DashboardConfig::default();
        assert_eq!(AppState::new(&config).threshold_slider_range(), 2.0..=5.0);

        config.outlier.zscore_threshold = 1.5;
        let mut state = AppState::new(&config);
        assert_eq!(state.threshold_slider_range(), 1.5..=5.0);
        assert_eq!(state.outlier.zscore_threshold, 1.5);

        state.set_threshold(7.5);
        assert_eq!(state.threshold_slider_range(), 2.0..=7.5);
    }

    #[test]
    fn date_range_and_reset() {
        let (_file, mut state) = opened();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        state.set_date_range(day, day);
        assert_eq!(state.views.kpis.transaction_count, 1);
        state.reset_filters();
        assert_eq!(state.views.kpis.transaction_count, 3);
    }

    #[test]
    fn failed_open_sets_status() {
        let mut state = AppState::new(&DashboardConfig::default());
        assert!(state.open(Path::new("/nope/missing.csv")).is_err());
        assert!(state.status_message.is_some());
        assert!(state.dataset.is_none());
    }

    #[test]
    fn export_writes_json_summary() {
        let (_file, state) = opened();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("summary.json");
        state.export_summary(&out).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["kpis"]["transaction_count"], 3);
    }

    #[test]
    fn reload_skipped_while_file_unchanged() {
        let (_file, mut state) = opened();
        assert!(!state.reload_if_changed().unwrap());
    }

    #[test]
    fn force_reload_picks_up_new_rows_and_resets_filters() {
        let (mut file, mut state) = opened();
        state.toggle_label(LabelColumn::Category, "Travel");
        file.write_all(b"T5,2024-01-04 10:00:00,7,Food,Cafe,Card,Checking,debit,\n")
            .unwrap();
        state.force_reload().unwrap();
        assert_eq!(state.views.kpis.transaction_count, 4);
        assert!(state.selection.categories.is_empty());
    }
}
