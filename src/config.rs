use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;

use crate::data::outliers::OutlierConfig;

pub const DEFAULT_TOP_N_MERCHANTS: usize = 15;

/// Command-line arguments.
#[derive(Debug, Default, Parser)]
#[command(name = "ledger-lens", version, about = "Financial transactions dashboard")]
pub struct Cli {
    /// Transactions CSV to open at startup
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// JSON settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Initial z-score threshold for outlier flagging
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Initial number of merchants in the top-merchants chart
    #[arg(long)]
    pub top_n: Option<usize>,
}

/// Dashboard settings. Every field may be omitted from the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: Option<PathBuf>,
    pub outlier: OutlierConfig,
    pub top_n_merchants: usize,
    pub window_size: [f32; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            outlier: OutlierConfig::default(),
            top_n_merchants: DEFAULT_TOP_N_MERCHANTS,
            window_size: [1280.0, 860.0],
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Defaults, then the config file, then command-line overrides.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(data) = &cli.data {
            config.data_path = Some(data.clone());
        }
        if let Some(threshold) = cli.threshold {
            config.outlier.zscore_threshold = threshold;
        }
        if let Some(n) = cli.top_n {
            config.top_n_merchants = n;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let t = self.outlier.zscore_threshold;
        if !t.is_finite() || t <= 0.0 {
            bail!("z-score threshold must be a positive number, got {t}");
        }
        if self.top_n_merchants == 0 {
            bail!("top_n_merchants must be at least 1");
        }
        Ok(())
    }
}
