use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ScreenerError;

/// Daily OHLCV bar. Missing numeric readings are `f64::NAN`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Date-ordered price history for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series from bars. Dates must be strictly increasing; a
    /// duplicate or out-of-order date is a feed error, not something to
    /// silently reorder.
    pub fn new(bars: Vec<Bar>) -> Result<Self, ScreenerError> {
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ScreenerError::InvalidData(format!(
                    "non-increasing date {} after {}",
                    pair[1].date, pair[0].date
                )));
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

/// The six fundamentals metrics that feed the quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityMetric {
    Roe,
    DebtEquity,
    OperatingMargin,
    CurrentRatio,
    ProfitMargin,
    Roa,
}

impl QualityMetric {
    pub const ALL: [QualityMetric; 6] = [
        QualityMetric::Roe,
        QualityMetric::DebtEquity,
        QualityMetric::OperatingMargin,
        QualityMetric::CurrentRatio,
        QualityMetric::ProfitMargin,
        QualityMetric::Roa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityMetric::Roe => "roe",
            QualityMetric::DebtEquity => "debt_equity",
            QualityMetric::OperatingMargin => "operating_margin",
            QualityMetric::CurrentRatio => "current_ratio",
            QualityMetric::ProfitMargin => "profit_margin",
            QualityMetric::Roa => "roa",
        }
    }

    /// Plausible range for the metric; readings outside it are treated as
    /// data errors rather than extreme-but-real values.
    pub fn sane_range(&self) -> (f64, f64) {
        match self {
            QualityMetric::Roe => (-100.0, 200.0),
            QualityMetric::DebtEquity => (0.0, 10.0),
            QualityMetric::OperatingMargin => (-50.0, 100.0),
            QualityMetric::CurrentRatio => (0.0, 20.0),
            QualityMetric::ProfitMargin => (-50.0, 100.0),
            QualityMetric::Roa => (-50.0, 100.0),
        }
    }

    /// Leverage scores better when low; everything else when high
    pub fn lower_is_better(&self) -> bool {
        matches!(self, QualityMetric::DebtEquity)
    }
}

/// Per-symbol fundamentals snapshot with explicit optional fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    pub symbol: String,
    pub roe: Option<f64>,
    pub debt_equity: Option<f64>,
    pub operating_margin: Option<f64>,
    pub current_ratio: Option<f64>,
    pub profit_margin: Option<f64>,
    pub roa: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub current_price: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
}

impl FundamentalsRecord {
    /// Value of one quality metric, with non-finite readings treated as absent
    pub fn metric(&self, metric: QualityMetric) -> Option<f64> {
        let value = match metric {
            QualityMetric::Roe => self.roe,
            QualityMetric::DebtEquity => self.debt_equity,
            QualityMetric::OperatingMargin => self.operating_margin,
            QualityMetric::CurrentRatio => self.current_ratio,
            QualityMetric::ProfitMargin => self.profit_margin,
            QualityMetric::Roa => self.roa,
        };
        value.filter(|v| v.is_finite())
    }
}

/// Momentum metrics for one symbol relative to its universe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsMetrics {
    pub symbol: String,
    /// Percentile of the lookback return within the universe, 0-100
    pub rs_percentile: f64,
    /// Ordinal rank, 1 = strongest; `UNRANKED` when no return is computable
    pub rs_rank: u32,
    pub return_1m: Option<f64>,
    pub return_3m: Option<f64>,
    pub return_6m: Option<f64>,
    pub return_12m: Option<f64>,
    /// Annualized volatility in percent
    pub volatility: Option<f64>,
    /// R-squared of a linear price fit, 0-100
    pub trend_strength: f64,
    /// Deviation of the stock/benchmark ratio from its long-run average
    #[serde(default)]
    pub mansfield_rs: Option<f64>,
}

impl RsMetrics {
    pub const UNRANKED: u32 = 999;
}

/// Letter grade for a quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    APlus,
    A,
    BPlus,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::APlus,
            s if s >= 80.0 => Grade::A,
            s if s >= 70.0 => Grade::BPlus,
            s if s >= 60.0 => Grade::B,
            s if s >= 50.0 => Grade::C,
            _ => Grade::D,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

/// Quality assessment derived from one fundamentals record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub score: f64,
    pub grade: Grade,
}

/// Discrete recommendation tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    StrongWatch,
    Watch,
    Avoid,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::StrongWatch => "STRONG_WATCH",
            Signal::Watch => "WATCH",
            Signal::Avoid => "AVOID",
        }
    }
}

/// Joined momentum + quality view of one symbol, prior to scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub symbol: String,
    #[serde(default)]
    pub sector: Option<String>,
    pub rs: RsMetrics,
    pub quality: Option<QualityScore>,
    pub roe: Option<f64>,
    pub debt_equity: Option<f64>,
    pub operating_margin: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub current_price: Option<f64>,
}

/// Final ranked row produced by a screening run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub stock: StockSnapshot,
    pub composite_score: f64,
    pub signal: Signal,
    /// Optional narrative from the summarizer collaborator; never feeds back
    /// into scores or signals
    #[serde(default)]
    pub summary: Option<String>,
}
