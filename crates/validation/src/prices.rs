use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use screener_core::PriceSeries;

/// Single-period moves beyond this fraction are treated as feed errors
const MAX_SINGLE_PERIOD_MOVE: f64 = 0.50;

/// Share of missing closes tolerated before a series is rejected
const MAX_MISSING_CLOSE_PCT: f64 = 5.0;

/// A series whose last bar is older than this is stale
const MAX_STALENESS_DAYS: i64 = 7;

/// Reason a symbol's price history was rejected. Checks run as a conjunction
/// in a fixed order and stop at the first failure.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum PriceIssue {
    #[error("No price data available")]
    Missing,

    #[error("Insufficient data: {have} days (need {need})")]
    InsufficientHistory { have: usize, need: usize },

    #[error("Too many missing values: {pct:.1}%")]
    ExcessiveMissingCloses { pct: f64 },

    #[error("Extreme price movement detected (possible data error)")]
    ExtremeMove,

    #[error("Stale data: last update {days_old} days ago")]
    StaleData { days_old: i64 },

    #[error("Missing volume data")]
    MissingVolume,
}

/// Filter price histories that are too short, too stale, or too dirty to
/// screen. Passing series are returned unchanged; every rejection carries
/// its reason. `as_of` anchors the staleness check so runs are reproducible.
pub fn validate_prices(
    price_data: HashMap<String, PriceSeries>,
    min_days: usize,
    as_of: NaiveDate,
) -> (HashMap<String, PriceSeries>, BTreeMap<String, PriceIssue>) {
    let mut valid = HashMap::new();
    let mut issues = BTreeMap::new();

    for (symbol, series) in price_data {
        match check_series(&series, min_days, as_of) {
            Ok(()) => {
                valid.insert(symbol, series);
            }
            Err(issue) => {
                issues.insert(symbol, issue);
            }
        }
    }

    (valid, issues)
}

fn check_series(series: &PriceSeries, min_days: usize, as_of: NaiveDate) -> Result<(), PriceIssue> {
    if series.is_empty() {
        return Err(PriceIssue::Missing);
    }

    if series.len() < min_days {
        return Err(PriceIssue::InsufficientHistory {
            have: series.len(),
            need: min_days,
        });
    }

    let closes = series.closes();
    let missing = closes.iter().filter(|c| !c.is_finite()).count();
    let missing_pct = missing as f64 / closes.len() as f64 * 100.0;
    if missing_pct > MAX_MISSING_CLOSE_PCT {
        return Err(PriceIssue::ExcessiveMissingCloses { pct: missing_pct });
    }

    for pair in closes.windows(2) {
        if pair[0].is_finite() && pair[1].is_finite() && pair[0] != 0.0 {
            let change = (pair[1] - pair[0]) / pair[0];
            if change.abs() > MAX_SINGLE_PERIOD_MOVE {
                return Err(PriceIssue::ExtremeMove);
            }
        }
    }

    if let Some(last_date) = series.last_date() {
        let days_old = (as_of - last_date).num_days();
        if days_old > MAX_STALENESS_DAYS {
            return Err(PriceIssue::StaleData { days_old });
        }
    }

    let has_volume = series.bars().iter().any(|b| b.volume.is_finite());
    if !has_volume {
        return Err(PriceIssue::MissingVolume);
    }

    Ok(())
}
