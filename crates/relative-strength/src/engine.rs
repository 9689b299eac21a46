use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use statrs::statistics::Statistics;

use screener_core::{PriceSeries, RsConfig, RsMetrics, TRADING_DAYS_PER_MONTH, TRADING_DAYS_PER_YEAR};

/// Computes momentum metrics for a universe of symbols, optionally against a
/// benchmark index. The engine is immutable after construction, so the
/// percentile and rank of every symbol are taken against the same snapshot
/// of the universe.
pub struct RsEngine {
    price_data: HashMap<String, PriceSeries>,
    returns: HashMap<String, Vec<f64>>,
    /// Lookback return per symbol, computed once so percentile/rank stay O(n)
    lookback_returns: HashMap<String, Option<f64>>,
    config: RsConfig,
}

impl RsEngine {
    pub fn new(price_data: HashMap<String, PriceSeries>, config: RsConfig) -> Self {
        let returns: HashMap<String, Vec<f64>> = price_data
            .iter()
            .map(|(symbol, series)| (symbol.clone(), daily_returns(&series.closes())))
            .collect();

        let mut engine = Self {
            price_data,
            returns,
            lookback_returns: HashMap::new(),
            config,
        };
        let lookback: HashMap<String, Option<f64>> = engine
            .price_data
            .keys()
            .map(|symbol| {
                let ret = engine
                    .period_return(symbol, engine.config.lookback_period, engine.config.skip_recent_days)
                    .filter(|r| r.is_finite());
                (symbol.clone(), ret)
            })
            .collect();
        engine.lookback_returns = lookback;
        engine
    }

    /// Metrics for every symbol in the universe, in symbol order. Per-symbol
    /// computations are independent, so the map runs in parallel; the
    /// percentile/rank inputs were fixed at construction.
    pub fn compute_all(&self, benchmark: Option<&PriceSeries>) -> Vec<RsMetrics> {
        let mut symbols: Vec<&String> = self.price_data.keys().collect();
        symbols.sort();

        symbols
            .par_iter()
            .map(|symbol| self.metrics_for(symbol, benchmark))
            .collect()
    }

    /// Full metrics record for one symbol
    pub fn metrics_for(&self, symbol: &str, benchmark: Option<&PriceSeries>) -> RsMetrics {
        RsMetrics {
            symbol: symbol.to_string(),
            rs_percentile: self.rs_percentile(symbol),
            rs_rank: self.rs_rank(symbol),
            return_1m: self.period_return(symbol, TRADING_DAYS_PER_MONTH, 0),
            return_3m: self.period_return(symbol, 63, 0),
            return_6m: self.period_return(symbol, 126, 0),
            return_12m: self.period_return(symbol, TRADING_DAYS_PER_YEAR, 0),
            volatility: self.volatility(symbol),
            trend_strength: self.trend_strength(symbol),
            mansfield_rs: benchmark.and_then(|b| self.mansfield_rs(symbol, b)),
        }
    }

    /// Percentage return over `period` bars, anchored `skip_recent` bars
    /// before the last observation. The skip keeps the most recent month out
    /// of the momentum window.
    pub fn period_return(&self, symbol: &str, period: usize, skip_recent: usize) -> Option<f64> {
        let series = self.price_data.get(symbol)?;
        let closes = series.closes();
        if period == 0 || closes.len() < period + skip_recent {
            return None;
        }
        let end_price = closes[closes.len() - 1 - skip_recent];
        let start_price = closes[closes.len() - period - skip_recent];
        if start_price == 0.0 || !start_price.is_finite() || !end_price.is_finite() {
            return None;
        }
        Some((end_price / start_price - 1.0) * 100.0)
    }

    /// Percentile of this symbol's lookback return within the universe,
    /// 0-100. Strict less-than comparison only, so tied returns share a
    /// percentile. A symbol without a computable return scores 0; an empty
    /// usable universe scores a neutral 50.
    pub fn rs_percentile(&self, symbol: &str) -> f64 {
        let stock_return = match self.lookback_returns.get(symbol) {
            Some(Some(r)) => *r,
            _ => return 0.0,
        };
        let universe: Vec<f64> = self.lookback_returns.values().flatten().copied().collect();
        if universe.is_empty() {
            return 50.0;
        }
        let below = universe.iter().filter(|&&r| r < stock_return).count();
        below as f64 / universe.len() as f64 * 100.0
    }

    /// Ordinal rank by lookback return, 1 = strongest. Symbols without a
    /// computable return get the `UNRANKED` sentinel.
    pub fn rs_rank(&self, symbol: &str) -> u32 {
        if !matches!(self.lookback_returns.get(symbol), Some(Some(_))) {
            return RsMetrics::UNRANKED;
        }
        let mut ranked: Vec<(&str, f64)> = self
            .lookback_returns
            .iter()
            .filter_map(|(s, r)| r.map(|r| (s.as_str(), r)))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
            .iter()
            .position(|(s, _)| *s == symbol)
            .map(|i| i as u32 + 1)
            .unwrap_or(RsMetrics::UNRANKED)
    }

    /// Annualized standard deviation of the most recent daily returns, in
    /// percent. Unavailable until a full volatility window of returns exists.
    pub fn volatility(&self, symbol: &str) -> Option<f64> {
        let returns = self.returns.get(symbol)?;
        let finite: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
        if finite.len() < self.config.volatility_period {
            return None;
        }
        let recent = &finite[finite.len() - self.config.volatility_period..];
        Some(recent.std_dev() * (TRADING_DAYS_PER_YEAR as f64).sqrt() * 100.0)
    }

    /// R-squared of a linear close-vs-time fit over the trend window, scaled
    /// to 0-100. Zero when data is insufficient or the series has no
    /// variance to explain.
    pub fn trend_strength(&self, symbol: &str) -> f64 {
        let series = match self.price_data.get(symbol) {
            Some(s) => s,
            None => return 0.0,
        };
        let closes = series.closes();
        let window = self.config.trend_strength_period;
        if window == 0 || closes.len() < window {
            return 0.0;
        }
        let prices = &closes[closes.len() - window..];
        if prices.iter().any(|p| !p.is_finite()) {
            return 0.0;
        }

        let n = prices.len() as f64;
        let sum_x: f64 = (0..prices.len()).map(|i| i as f64).sum();
        let sum_y: f64 = prices.iter().sum();
        let sum_xy: f64 = prices.iter().enumerate().map(|(i, p)| i as f64 * p).sum();
        let sum_x2: f64 = (0..prices.len()).map(|i| (i * i) as f64).sum();

        let denom = n * sum_x2 - sum_x * sum_x;
        if denom == 0.0 {
            return 0.0;
        }
        let slope = (n * sum_xy - sum_x * sum_y) / denom;
        let intercept = (sum_y - slope * sum_x) / n;
        let mean_y = sum_y / n;

        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for (i, price) in prices.iter().enumerate() {
            let predicted = slope * i as f64 + intercept;
            ss_res += (price - predicted).powi(2);
            ss_tot += (price - mean_y).powi(2);
        }
        if ss_tot <= 0.0 {
            return 0.0;
        }
        ((1.0 - ss_res / ss_tot) * 100.0).clamp(0.0, 100.0)
    }

    /// Mansfield relative strength: percentage deviation of the
    /// stock/benchmark price ratio from its own trailing moving average.
    /// Positive readings mean the stock is outperforming its long-run trend
    /// against the benchmark. Requires a full MA window of overlapping dates.
    pub fn mansfield_rs(&self, symbol: &str, benchmark: &PriceSeries) -> Option<f64> {
        let series = self.price_data.get(symbol)?;
        let bench_by_date: HashMap<NaiveDate, f64> = benchmark
            .bars()
            .iter()
            .map(|b| (b.date, b.close))
            .collect();

        let mut ratio = Vec::new();
        for bar in series.bars() {
            if let Some(&bench_close) = bench_by_date.get(&bar.date) {
                if bench_close != 0.0 && bench_close.is_finite() && bar.close.is_finite() {
                    ratio.push(bar.close / bench_close);
                }
            }
        }

        let ma_period = self.config.mansfield_ma_period;
        if ma_period == 0 || ratio.len() < ma_period {
            return None;
        }
        let window = &ratio[ratio.len() - ma_period..];
        let current_ma = window.iter().sum::<f64>() / ma_period as f64;
        let current_ratio = *ratio.last()?;
        if current_ma == 0.0 || !current_ma.is_finite() {
            return None;
        }
        Some((current_ratio / current_ma - 1.0) * 100.0)
    }
}

/// Simple daily returns from a close series; pairs with a zero or missing
/// base price yield NaN and are filtered by consumers
fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|w| {
            if w[0] != 0.0 && w[0].is_finite() && w[1].is_finite() {
                (w[1] - w[0]) / w[0]
            } else {
                f64::NAN
            }
        })
        .collect()
}
