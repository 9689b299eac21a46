use std::collections::HashMap;

use screener_core::{FundamentalsRecord, Grade, QualityConfig, QualityMetric, QualityScore};

/// Scores fundamentals rows on the six-metric quality ladder
pub struct QualityEngine {
    config: QualityConfig,
}

impl QualityEngine {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Weighted quality score and letter grade for one record. A missing
    /// metric imputes a neutral half-credit sub-score so that incomplete
    /// fundamentals dilute the blend instead of zeroing it out.
    pub fn score(&self, record: &FundamentalsRecord) -> QualityScore {
        let mut score = 0.0;
        for metric in QualityMetric::ALL {
            let weight = self.config.weights.get(metric);
            let sub_score = match record.metric(metric) {
                Some(value) => self.metric_sub_score(metric, value),
                None => 0.5,
            };
            score += weight * sub_score;
        }
        let score = (score * 100.0).min(100.0);
        QualityScore {
            score,
            grade: Grade::from_score(score),
        }
    }

    /// Map a raw metric value through its four-tier ladder to a 0..=1
    /// sub-score. Leverage compares downward, every other metric upward.
    fn metric_sub_score(&self, metric: QualityMetric, value: f64) -> f64 {
        let tiers = self.config.thresholds(metric);
        if metric.lower_is_better() {
            if value <= tiers.excellent {
                1.0
            } else if value <= tiers.good {
                0.75
            } else if value <= tiers.acceptable {
                0.50
            } else if value <= tiers.poor {
                0.25
            } else {
                0.0
            }
        } else if value >= tiers.excellent {
            1.0
        } else if value >= tiers.good {
            0.75
        } else if value >= tiers.acceptable {
            0.50
        } else if value >= tiers.poor {
            0.25
        } else {
            0.0
        }
    }

    /// Coarse quality gate: at least two of the ROE / leverage / margin
    /// checks must be evaluable, and every evaluable check must pass.
    pub fn is_quality_stock(
        &self,
        record: &FundamentalsRecord,
        min_roe: f64,
        max_de: f64,
        min_margin: f64,
    ) -> bool {
        let mut checks = Vec::new();
        if let Some(roe) = record.metric(QualityMetric::Roe) {
            checks.push(roe >= min_roe);
        }
        if let Some(de) = record.metric(QualityMetric::DebtEquity) {
            checks.push(de <= max_de);
        }
        if let Some(margin) = record.metric(QualityMetric::OperatingMargin) {
            checks.push(margin >= min_margin);
        }
        checks.len() >= 2 && checks.iter().all(|&passed| passed)
    }

    /// Quality scores for a batch of records, keyed by symbol
    pub fn score_all(&self, records: &[FundamentalsRecord]) -> HashMap<String, QualityScore> {
        records
            .iter()
            .map(|record| (record.symbol.clone(), self.score(record)))
            .collect()
    }
}

impl Default for QualityEngine {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(symbol: &str) -> FundamentalsRecord {
        FundamentalsRecord {
            symbol: symbol.to_string(),
            ..FundamentalsRecord::default()
        }
    }

    fn excellent_record() -> FundamentalsRecord {
        FundamentalsRecord {
            roe: Some(25.0),
            debt_equity: Some(0.2),
            operating_margin: Some(25.0),
            current_ratio: Some(2.5),
            profit_margin: Some(12.0),
            roa: Some(12.0),
            ..record("AAA")
        }
    }

    #[test]
    fn test_all_excellent_scores_full_marks() {
        let engine = QualityEngine::default();
        let quality = engine.score(&excellent_record());
        assert!((quality.score - 100.0).abs() < 0.001);
        assert_eq!(quality.grade, Grade::APlus);
    }

    #[test]
    fn test_all_missing_scores_neutral() {
        let engine = QualityEngine::default();
        let quality = engine.score(&record("AAA"));
        assert!((quality.score - 50.0).abs() < 0.001);
        assert_eq!(quality.grade, Grade::C);
    }

    #[test]
    fn test_score_monotonic_in_roe() {
        let engine = QualityEngine::default();
        let mut prev = f64::NEG_INFINITY;
        for roe in [2.0, 7.0, 12.0, 17.0, 30.0] {
            let mut rec = excellent_record();
            rec.roe = Some(roe);
            let score = engine.score(&rec).score;
            assert!(score >= prev, "score dropped when ROE rose to {roe}");
            prev = score;
        }
    }

    #[test]
    fn test_score_non_increasing_in_debt_equity() {
        let engine = QualityEngine::default();
        let mut prev = f64::INFINITY;
        for de in [0.1, 0.4, 0.8, 1.5, 3.0] {
            let mut rec = excellent_record();
            rec.debt_equity = Some(de);
            let score = engine.score(&rec).score;
            assert!(score <= prev, "score rose when leverage rose to {de}");
            prev = score;
        }
    }

    #[test]
    fn test_tier_boundaries_inclusive() {
        let engine = QualityEngine::default();
        // ROE exactly at the excellent cutoff earns full credit
        let mut rec = record("AAA");
        rec.roe = Some(20.0);
        let at_cutoff = engine.score(&rec).score;
        rec.roe = Some(19.99);
        let below_cutoff = engine.score(&rec).score;
        assert!(at_cutoff > below_cutoff);
    }

    #[test]
    fn test_grade_ladder() {
        assert_eq!(Grade::from_score(95.0), Grade::APlus);
        assert_eq!(Grade::from_score(90.0), Grade::APlus);
        assert_eq!(Grade::from_score(85.0), Grade::A);
        assert_eq!(Grade::from_score(72.0), Grade::BPlus);
        assert_eq!(Grade::from_score(60.0), Grade::B);
        assert_eq!(Grade::from_score(50.0), Grade::C);
        assert_eq!(Grade::from_score(10.0), Grade::D);
    }

    #[test]
    fn test_quality_gate_passes_on_all_evaluable() {
        let engine = QualityEngine::default();
        let rec = excellent_record();
        assert!(engine.is_quality_stock(&rec, 15.0, 1.0, 10.0));
    }

    #[test]
    fn test_quality_gate_fails_on_single_failing_check() {
        let engine = QualityEngine::default();
        let mut rec = excellent_record();
        rec.debt_equity = Some(2.5);
        assert!(!engine.is_quality_stock(&rec, 15.0, 1.0, 10.0));
    }

    #[test]
    fn test_quality_gate_needs_two_evaluable_checks() {
        let engine = QualityEngine::default();
        let mut rec = record("AAA");
        rec.roe = Some(30.0);
        // Only one of the three checks can be evaluated
        assert!(!engine.is_quality_stock(&rec, 15.0, 1.0, 10.0));

        rec.operating_margin = Some(20.0);
        assert!(engine.is_quality_stock(&rec, 15.0, 1.0, 10.0));
    }

    #[test]
    fn test_score_all_keys_by_symbol() {
        let engine = QualityEngine::default();
        let records = vec![excellent_record(), record("BBB")];
        let scores = engine.score_all(&records);
        assert_eq!(scores.len(), 2);
        assert!(scores["AAA"].score > scores["BBB"].score);
    }
}
