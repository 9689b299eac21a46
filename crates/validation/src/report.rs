use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{FundamentalsIssues, PriceIssue, RsIssue};

/// One symbol's combined view across all validation passes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReportRow {
    pub symbol: String,
    pub issues: String,
    pub price_issue: bool,
    pub fundamental_issue: bool,
    pub rs_issue: bool,
}

/// Diagnostic report joining the three per-symbol issue maps into one
/// audit-friendly table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub rows: Vec<ValidationReportRow>,
}

impl ValidationReport {
    pub fn build(
        price_issues: &BTreeMap<String, PriceIssue>,
        fundamentals_issues: &BTreeMap<String, FundamentalsIssues>,
        rs_issues: &BTreeMap<String, RsIssue>,
    ) -> Self {
        let symbols: BTreeSet<&String> = price_issues
            .keys()
            .chain(fundamentals_issues.keys())
            .chain(rs_issues.keys())
            .collect();

        let rows = symbols
            .into_iter()
            .map(|symbol| {
                let mut parts = Vec::new();
                if let Some(issue) = price_issues.get(symbol) {
                    parts.push(format!("Price: {issue}"));
                }
                if let Some(issues) = fundamentals_issues.get(symbol) {
                    parts.push(format!("Fundamentals: {issues}"));
                }
                if let Some(issue) = rs_issues.get(symbol) {
                    parts.push(format!("RS: {issue}"));
                }
                ValidationReportRow {
                    symbol: symbol.clone(),
                    issues: parts.join(" | "),
                    price_issue: price_issues.contains_key(symbol),
                    fundamental_issue: fundamentals_issues.contains_key(symbol),
                    rs_issue: rs_issues.contains_key(symbol),
                }
            })
            .collect();

        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Overall data-completeness score for one symbol: usable price history is
/// worth 40 points, fundamentals up to 40 pro-rated by valid metric count,
/// RS metrics 20.
pub fn data_quality_score(has_price: bool, valid_metric_count: usize, has_rs: bool) -> f64 {
    let mut score = 0.0;
    if has_price {
        score += 40.0;
    }
    score += valid_metric_count.min(6) as f64 / 6.0 * 40.0;
    if has_rs {
        score += 20.0;
    }
    score
}

pub fn data_quality_grade(score: f64) -> char {
    match score {
        s if s >= 90.0 => 'A',
        s if s >= 75.0 => 'B',
        s if s >= 60.0 => 'C',
        s if s >= 40.0 => 'D',
        _ => 'F',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_joins_issue_sources() {
        let price_issues = BTreeMap::from([("AAA".to_string(), PriceIssue::Missing)]);
        let fundamentals_issues = BTreeMap::from([(
            "AAA".to_string(),
            FundamentalsIssues {
                missing: vec!["roe".to_string()],
                invalid: vec![],
            },
        )]);
        let rs_issues = BTreeMap::from([("BBB".to_string(), RsIssue::ExtremeVolatility(180.0))]);

        let report = ValidationReport::build(&price_issues, &fundamentals_issues, &rs_issues);
        assert_eq!(report.rows.len(), 2);

        let aaa = &report.rows[0];
        assert_eq!(aaa.symbol, "AAA");
        assert!(aaa.price_issue && aaa.fundamental_issue && !aaa.rs_issue);
        assert!(aaa.issues.contains("Price: No price data available"));
        assert!(aaa.issues.contains("Fundamentals: Missing: roe"));

        let bbb = &report.rows[1];
        assert!(bbb.rs_issue && !bbb.price_issue);
    }

    #[test]
    fn test_data_quality_score_pro_rates_fundamentals() {
        assert_eq!(data_quality_score(true, 6, true), 100.0);
        assert_eq!(data_quality_score(true, 3, true), 80.0);
        assert_eq!(data_quality_score(true, 0, false), 40.0);
        assert_eq!(data_quality_score(false, 0, false), 0.0);
    }

    #[test]
    fn test_data_quality_grades() {
        assert_eq!(data_quality_grade(100.0), 'A');
        assert_eq!(data_quality_grade(80.0), 'B');
        assert_eq!(data_quality_grade(60.0), 'C');
        assert_eq!(data_quality_grade(40.0), 'D');
        assert_eq!(data_quality_grade(20.0), 'F');
    }
}
