use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use screener_core::RsMetrics;

/// Annualized volatility beyond this is treated as a data artifact, not a
/// tradable characteristic
pub const MAX_VOLATILITY_PCT: f64 = 150.0;

/// Reason a computed RS row was dropped before screening
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RsIssue {
    #[error("Invalid RS percentile: {0}")]
    InvalidPercentile(f64),

    #[error("Extreme volatility: {0:.1}%")]
    ExtremeVolatility(f64),
}

/// Drop rows whose percentile is outside 0-100 or whose volatility reading
/// is implausible. The batch always survives; only offending rows leave.
pub fn validate_rs(rows: Vec<RsMetrics>) -> (Vec<RsMetrics>, BTreeMap<String, RsIssue>) {
    let mut valid = Vec::new();
    let mut issues = BTreeMap::new();

    for row in rows {
        if !row.rs_percentile.is_finite() || row.rs_percentile < 0.0 || row.rs_percentile > 100.0 {
            issues.insert(row.symbol.clone(), RsIssue::InvalidPercentile(row.rs_percentile));
            continue;
        }
        if let Some(vol) = row.volatility {
            if vol > MAX_VOLATILITY_PCT {
                issues.insert(row.symbol.clone(), RsIssue::ExtremeVolatility(vol));
                continue;
            }
        }
        valid.push(row);
    }

    (valid, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(symbol: &str, percentile: f64, volatility: Option<f64>) -> RsMetrics {
        RsMetrics {
            symbol: symbol.to_string(),
            rs_percentile: percentile,
            rs_rank: 1,
            return_1m: Some(2.0),
            return_3m: Some(6.0),
            return_6m: Some(12.0),
            return_12m: Some(25.0),
            volatility,
            trend_strength: 80.0,
            mansfield_rs: None,
        }
    }

    #[test]
    fn test_clean_rows_pass() {
        let (valid, issues) = validate_rs(vec![row("AAA", 88.0, Some(22.0))]);
        assert_eq!(valid.len(), 1);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_non_finite_percentile_dropped() {
        let (valid, issues) = validate_rs(vec![row("AAA", f64::NAN, Some(22.0))]);
        assert!(valid.is_empty());
        assert!(matches!(issues["AAA"], RsIssue::InvalidPercentile(_)));
    }

    #[test]
    fn test_out_of_range_percentile_dropped() {
        let (valid, issues) = validate_rs(vec![row("AAA", 120.0, None)]);
        assert!(valid.is_empty());
        assert_eq!(issues["AAA"], RsIssue::InvalidPercentile(120.0));
    }

    #[test]
    fn test_extreme_volatility_dropped() {
        let (valid, issues) = validate_rs(vec![
            row("AAA", 90.0, Some(200.0)),
            row("BBB", 70.0, Some(30.0)),
        ]);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].symbol, "BBB");
        assert_eq!(issues["AAA"], RsIssue::ExtremeVolatility(200.0));
    }

    #[test]
    fn test_missing_volatility_tolerated() {
        let (valid, issues) = validate_rs(vec![row("AAA", 55.0, None)]);
        assert_eq!(valid.len(), 1);
        assert!(issues.is_empty());
    }
}
