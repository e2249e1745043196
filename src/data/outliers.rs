use serde::{Deserialize, Serialize};

use super::model::Transaction;

/// Sensitivity of the z-score outlier detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub zscore_threshold: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            zscore_threshold: 3.0,
        }
    }
}

/// A transaction with its standard score and outlier flag appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedTransaction {
    pub transaction: Transaction,
    pub zscore: f64,
    pub is_outlier: bool,
}

/// Population mean and standard deviation (divisor N).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// `None` for an empty slice.
pub fn population_stats(values: &[f64]) -> Option<PopulationStats> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(PopulationStats {
        mean,
        std_dev: variance.sqrt(),
    })
}

/// Score every transaction against the mean and spread of the given slice.
///
/// When all amounts are identical the deviation is zero and `1.0` is used as
/// the divisor instead, so scores degrade to `amount - mean`.
pub fn detect_outliers(transactions: &[Transaction], config: &OutlierConfig) -> Vec<FlaggedTransaction> {
    let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
    let Some(stats) = population_stats(&amounts) else {
        return Vec::new();
    };
    let divisor = if stats.std_dev == 0.0 { 1.0 } else { stats.std_dev };

    let flagged: Vec<FlaggedTransaction> = transactions
        .iter()
        .map(|t| {
            let zscore = (t.amount - stats.mean) / divisor;
            FlaggedTransaction {
                transaction: t.clone(),
                zscore,
                is_outlier: zscore.abs() >= config.zscore_threshold,
            }
        })
        .collect();

    log::debug!(
        "Outlier pass: n={} mean={:.2} std={:.2} threshold={} flagged={}",
        flagged.len(),
        stats.mean,
        stats.std_dev,
        config.zscore_threshold,
        flagged.iter().filter(|f| f.is_outlier).count()
    );
    flagged
}

/// Flagged rows only, largest `|zscore|` first.
pub fn ranked_outliers(flagged: &[FlaggedTransaction]) -> Vec<&FlaggedTransaction> {
    let mut out: Vec<&FlaggedTransaction> = flagged.iter().filter(|f| f.is_outlier).collect();
    out.sort_by(|a, b| b.zscore.abs().total_cmp(&a.zscore.abs()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::tx;

    fn amounts(values: &[f64]) -> Vec<Transaction> {
        values
            .iter()
            .enumerate()
            .map(|(i, &a)| tx(&i.to_string(), "2024-01-01 12:00:00", a, "C", "M"))
            .collect()
    }

    #[test]
    fn three_row_scenario() {
        let flagged = detect_outliers(&amounts(&[10.0, 20.0, 30.0]), &OutlierConfig::default());
        let z: Vec<f64> = flagged.iter().map(|f| f.zscore).collect();
        assert!((z[0] + 1.224_744_9).abs() < 1e-6);
        assert_eq!(z[1], 0.0);
        assert!((z[2] - 1.224_744_9).abs() < 1e-6);
        assert!(flagged.iter().all(|f| !f.is_outlier));
    }

    #[test]
    fn identical_amounts_score_zero() {
        let cfg = OutlierConfig {
            zscore_threshold: 0.0001,
        };
        let flagged = detect_outliers(&amounts(&[10.0; 5]), &cfg);
        assert!(flagged.iter().all(|f| f.zscore == 0.0 && !f.is_outlier));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(detect_outliers(&[], &OutlierConfig::default()).is_empty());
    }

    #[test]
    fn lower_threshold_flags_tails_and_keeps_amounts() {
        let input = amounts(&[10.0, 20.0, 30.0]);
        let cfg = OutlierConfig {
            zscore_threshold: 1.2,
        };
        let flagged = detect_outliers(&input, &cfg);
        assert_eq!(
            flagged.iter().map(|f| f.is_outlier).collect::<Vec<_>>(),
            vec![true, false, true]
        );
        for (f, t) in flagged.iter().zip(&input) {
            assert_eq!(f.transaction.amount, t.amount);
        }
    }

    #[test]
    fn threshold_comparison_is_inclusive() {
        let cfg = OutlierConfig {
            zscore_threshold: 0.0,
        };
        let flagged = detect_outliers(&amounts(&[7.0, 7.0]), &cfg);
        assert!(flagged.iter().all(|f| f.is_outlier));
    }

    #[test]
    fn rerunning_on_own_output_is_stable() {
        let mut values = vec![5.0; 20];
        values.push(500.0);
        let cfg = OutlierConfig::default();
        let first = detect_outliers(&amounts(&values), &cfg);
        let again: Vec<Transaction> = first.iter().map(|f| f.transaction.clone()).collect();
        let second = detect_outliers(&again, &cfg);
        assert_eq!(first, second);
        assert!(first.last().unwrap().is_outlier);
    }

    #[test]
    fn ranked_outliers_orders_by_magnitude() {
        let mut values = vec![0.0; 30];
        values.push(100.0);
        values.push(-60.0);
        let cfg = OutlierConfig {
            zscore_threshold: 2.0,
        };
        let flagged = detect_outliers(&amounts(&values), &cfg);
        let ranked = ranked_outliers(&flagged);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].transaction.amount, 100.0);
        assert_eq!(ranked[1].transaction.amount, -60.0);
    }

    #[test]
    fn config_deserializes_with_default() {
        let cfg: OutlierConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.zscore_threshold, 3.0);
        let cfg: OutlierConfig = serde_json::from_str(r#"{"zscore_threshold": 2.5}"#).unwrap();
        assert_eq!(cfg.zscore_threshold, 2.5);
    }
}
