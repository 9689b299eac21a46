use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use screener_core::{FundamentalsRecord, QualityMetric};

/// Valid metrics required before a record is worth quality-scoring
pub const MIN_VALID_METRICS: usize = 4;

/// Itemized problems found in one fundamentals record. A record can appear
/// here and still be kept, as long as enough metrics survive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsIssues {
    pub missing: Vec<String>,
    pub invalid: Vec<String>,
}

impl FundamentalsIssues {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

impl fmt::Display for FundamentalsIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("Missing: {}", self.missing.join(", ")));
        }
        if !self.invalid.is_empty() {
            parts.push(format!("Invalid: {}", self.invalid.join(", ")));
        }
        write!(f, "{}", parts.join(" | "))
    }
}

/// Keep records with at least `MIN_VALID_METRICS` of the six quality metrics
/// present and inside their plausible ranges. Every record with any missing
/// or implausible metric is itemized in the issues map, kept or not.
pub fn validate_fundamentals(
    records: Vec<FundamentalsRecord>,
) -> (Vec<FundamentalsRecord>, BTreeMap<String, FundamentalsIssues>) {
    let mut valid = Vec::new();
    let mut issues_by_symbol = BTreeMap::new();

    for record in records {
        let mut issues = FundamentalsIssues::default();
        let mut valid_count = 0;

        for metric in QualityMetric::ALL {
            match record.metric(metric) {
                None => issues.missing.push(metric.as_str().to_string()),
                Some(value) => {
                    let (lo, hi) = metric.sane_range();
                    if value < lo || value > hi {
                        issues
                            .invalid
                            .push(format!("{}={:.2} (unrealistic)", metric.as_str(), value));
                    } else {
                        valid_count += 1;
                    }
                }
            }
        }

        if !issues.is_empty() {
            issues_by_symbol.insert(record.symbol.clone(), issues);
        }
        if valid_count >= MIN_VALID_METRICS {
            valid.push(record);
        }
    }

    (valid, issues_by_symbol)
}
