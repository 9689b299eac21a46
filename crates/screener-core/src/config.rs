use serde::{Deserialize, Serialize};

use crate::QualityMetric;

pub const TRADING_DAYS_PER_YEAR: usize = 252;
pub const TRADING_DAYS_PER_MONTH: usize = 21;

/// Relative-strength calculation windows, in trading days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsConfig {
    pub lookback_period: usize,
    /// Bars excluded from the end of the lookback window (the classic
    /// skip-a-month momentum convention)
    pub skip_recent_days: usize,
    pub mansfield_ma_period: usize,
    pub trend_strength_period: usize,
    pub volatility_period: usize,
}

impl Default for RsConfig {
    fn default() -> Self {
        Self {
            lookback_period: TRADING_DAYS_PER_YEAR,
            skip_recent_days: TRADING_DAYS_PER_MONTH,
            mansfield_ma_period: 252,
            trend_strength_period: 126,
            volatility_period: 60,
        }
    }
}

/// Cutoffs for one metric's four-tier scoring ladder
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierThresholds {
    pub excellent: f64,
    pub good: f64,
    pub acceptable: f64,
    pub poor: f64,
}

/// Relative weight of each metric in the quality blend. Weights sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityWeights {
    pub roe: f64,
    pub debt_equity: f64,
    pub operating_margin: f64,
    pub current_ratio: f64,
    pub profit_margin: f64,
    pub roa: f64,
}

impl QualityWeights {
    pub fn get(&self, metric: QualityMetric) -> f64 {
        match metric {
            QualityMetric::Roe => self.roe,
            QualityMetric::DebtEquity => self.debt_equity,
            QualityMetric::OperatingMargin => self.operating_margin,
            QualityMetric::CurrentRatio => self.current_ratio,
            QualityMetric::ProfitMargin => self.profit_margin,
            QualityMetric::Roa => self.roa,
        }
    }

    pub fn total(&self) -> f64 {
        QualityMetric::ALL.iter().map(|m| self.get(*m)).sum()
    }
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            roe: 0.25,
            debt_equity: 0.20,
            operating_margin: 0.20,
            current_ratio: 0.15,
            profit_margin: 0.10,
            roa: 0.10,
        }
    }
}

/// Threshold ladders and weights for the quality score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    pub roe: TierThresholds,
    pub debt_equity: TierThresholds,
    pub operating_margin: TierThresholds,
    pub current_ratio: TierThresholds,
    pub profit_margin: TierThresholds,
    pub roa: TierThresholds,
    pub weights: QualityWeights,
}

impl QualityConfig {
    pub fn thresholds(&self, metric: QualityMetric) -> TierThresholds {
        match metric {
            QualityMetric::Roe => self.roe,
            QualityMetric::DebtEquity => self.debt_equity,
            QualityMetric::OperatingMargin => self.operating_margin,
            QualityMetric::CurrentRatio => self.current_ratio,
            QualityMetric::ProfitMargin => self.profit_margin,
            QualityMetric::Roa => self.roa,
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            roe: TierThresholds { excellent: 20.0, good: 15.0, acceptable: 10.0, poor: 5.0 },
            // Lower is better for leverage, so the ladder ascends
            debt_equity: TierThresholds { excellent: 0.3, good: 0.5, acceptable: 1.0, poor: 2.0 },
            operating_margin: TierThresholds { excellent: 20.0, good: 15.0, acceptable: 10.0, poor: 5.0 },
            current_ratio: TierThresholds { excellent: 2.0, good: 1.5, acceptable: 1.0, poor: 0.8 },
            profit_margin: TierThresholds { excellent: 10.0, good: 7.0, acceptable: 5.0, poor: 2.0 },
            roa: TierThresholds { excellent: 10.0, good: 7.0, acceptable: 5.0, poor: 3.0 },
            weights: QualityWeights::default(),
        }
    }
}

/// Composite scoring strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    RsQuality,
    RsValue,
    RsLowVolatility,
    PureRs,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RsQuality => "RS + Quality",
            Strategy::RsValue => "RS + Value",
            Strategy::RsLowVolatility => "RS + Low Volatility",
            Strategy::PureRs => "Pure RS",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Strategy::RsQuality => "Optimal risk-adjusted returns",
            Strategy::RsValue => "Momentum + valuation focus",
            Strategy::RsLowVolatility => "Smooth, steady returns",
            Strategy::PureRs => "Maximum returns, maximum risk",
        }
    }
}

/// User-tunable screening thresholds. `None` on the fundamentals filters
/// disables them entirely; a present threshold still lets rows with the
/// metric missing pass (momentum-only candidates survive by policy).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningParams {
    /// Opaque universe selector, recorded for cache keys only
    #[serde(default)]
    pub sector: Option<String>,
    pub strategy: Strategy,
    pub rs_threshold: f64,
    pub min_roe: Option<f64>,
    pub max_de: Option<f64>,
    pub min_margin: Option<f64>,
    pub min_mcap: f64,
    pub max_results: usize,
}

impl Default for ScreeningParams {
    fn default() -> Self {
        Self {
            sector: None,
            strategy: Strategy::default(),
            rs_threshold: 80.0,
            min_roe: Some(15.0),
            max_de: Some(1.0),
            min_margin: Some(10.0),
            min_mcap: 5000.0,
            max_results: 50,
        }
    }
}

/// Composite/momentum floors for signal classification, evaluated in
/// priority order BUY, STRONG_WATCH, WATCH
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalThresholds {
    pub buy_composite_min: f64,
    pub buy_rs_min: f64,
    pub strong_watch_composite_min: f64,
    pub watch_composite_min: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            buy_composite_min: 75.0,
            buy_rs_min: 85.0,
            strong_watch_composite_min: 70.0,
            watch_composite_min: 60.0,
        }
    }
}
