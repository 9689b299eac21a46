use screener_core::{
    ScreeningParams, ScreeningResult, Signal, SignalThresholds, StockSnapshot, Strategy,
};

/// Filters the joined momentum + quality table and ranks survivors by a
/// strategy-weighted composite score
pub struct ScreeningEngine {
    params: ScreeningParams,
    thresholds: SignalThresholds,
}

impl ScreeningEngine {
    pub fn new(params: ScreeningParams) -> Self {
        Self {
            params,
            thresholds: SignalThresholds::default(),
        }
    }

    pub fn with_thresholds(params: ScreeningParams, thresholds: SignalThresholds) -> Self {
        Self { params, thresholds }
    }

    /// Intersect the row set with the configured thresholds. The momentum,
    /// market-cap, and price checks are hard; the fundamentals checks let
    /// rows with the metric missing survive on momentum alone. That is
    /// policy, not leniency by accident.
    pub fn apply_filters(&self, rows: Vec<StockSnapshot>) -> Vec<StockSnapshot> {
        let initial = rows.len();
        let filtered: Vec<StockSnapshot> = rows
            .into_iter()
            .filter(|row| self.passes_filters(row))
            .collect();
        tracing::info!("🔍 Filtered: {}/{} stocks passed", filtered.len(), initial);
        filtered
    }

    fn passes_filters(&self, row: &StockSnapshot) -> bool {
        if !row.rs.rs_percentile.is_finite() || row.rs.rs_percentile < self.params.rs_threshold {
            return false;
        }
        if let Some(min_roe) = self.params.min_roe {
            if row.roe.is_some_and(|roe| roe < min_roe) {
                return false;
            }
        }
        if let Some(max_de) = self.params.max_de {
            if row.debt_equity.is_some_and(|de| de > max_de) {
                return false;
            }
        }
        if let Some(min_margin) = self.params.min_margin {
            if row.operating_margin.is_some_and(|margin| margin < min_margin) {
                return false;
            }
        }
        if !row.market_cap.is_some_and(|mcap| mcap >= self.params.min_mcap) {
            return false;
        }
        row.current_price.is_some()
    }

    /// Composite scores, signals, and descending ranking for the filtered
    /// batch. P/E and volatility normalization is relative to this batch, so
    /// scores shift when the surviving universe does.
    pub fn score(&self, rows: Vec<StockSnapshot>) -> Vec<ScreeningResult> {
        let composites = self.composite_scores(&rows);
        let mut results: Vec<ScreeningResult> = rows
            .into_iter()
            .zip(composites)
            .map(|(stock, composite_score)| {
                let signal = self.classify(composite_score, stock.rs.rs_percentile);
                ScreeningResult {
                    stock,
                    composite_score,
                    signal,
                    summary: None,
                }
            })
            .collect();
        // Stable sort: equal composites keep their incoming order
        results.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }

    fn composite_scores(&self, rows: &[StockSnapshot]) -> Vec<f64> {
        match self.params.strategy {
            Strategy::RsQuality => rows
                .iter()
                .map(|row| 0.60 * row.rs.rs_percentile + 0.40 * quality_or_zero(row))
                .collect(),
            Strategy::RsValue => {
                let pe_values: Vec<Option<f64>> = rows.iter().map(|row| row.pe_ratio).collect();
                let pe_norm = inverted_min_max(&pe_values);
                rows.iter()
                    .zip(pe_norm)
                    .map(|(row, pe)| {
                        0.50 * row.rs.rs_percentile + 0.30 * pe + 0.20 * quality_or_zero(row)
                    })
                    .collect()
            }
            Strategy::RsLowVolatility => {
                let vol_values: Vec<Option<f64>> =
                    rows.iter().map(|row| row.rs.volatility).collect();
                let vol_norm = inverted_min_max(&vol_values);
                rows.iter()
                    .zip(vol_norm)
                    .map(|(row, vol)| 0.50 * row.rs.rs_percentile + 0.50 * vol)
                    .collect()
            }
            Strategy::PureRs => rows.iter().map(|row| row.rs.rs_percentile).collect(),
        }
    }

    /// First satisfied tier wins; BUY needs the composite floor AND the
    /// momentum floor jointly.
    fn classify(&self, composite: f64, rs_percentile: f64) -> Signal {
        let t = &self.thresholds;
        if composite >= t.buy_composite_min && rs_percentile >= t.buy_rs_min {
            Signal::Buy
        } else if composite >= t.strong_watch_composite_min {
            Signal::StrongWatch
        } else if composite >= t.watch_composite_min {
            Signal::Watch
        } else {
            Signal::Avoid
        }
    }
}

fn quality_or_zero(row: &StockSnapshot) -> f64 {
    row.quality.as_ref().map(|q| q.score).unwrap_or(0.0)
}

/// Batch-relative 0-100 normalization where lower raw values score higher.
/// Missing values land on the neutral midpoint, as does a degenerate batch
/// with no spread.
fn inverted_min_max(values: &[Option<f64>]) -> Vec<f64> {
    let finite: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    values
        .iter()
        .map(|value| match value {
            Some(v) if v.is_finite() && max > min => 100.0 - (v - min) / (max - min) * 100.0,
            _ => 50.0,
        })
        .collect()
}
