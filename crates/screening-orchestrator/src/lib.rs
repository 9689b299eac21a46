use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use quality_analysis::QualityEngine;
use relative_strength::RsEngine;
use screener_cache::{cache_key, CacheCategory, ScreenerCache};
use screener_core::{
    FundamentalsRecord, PriceSeries, QualityConfig, RsConfig, ScreeningParams, ScreeningResult,
    StockSnapshot,
};
use screening_engine::ScreeningEngine;
use validation::{
    validate_fundamentals, validate_prices, validate_rs, FundamentalsIssues, PriceIssue, RsIssue,
    ValidationReport,
};

pub mod summary;
pub use summary::Summarizer;

/// Minimum price history required before a symbol can be screened
pub const MIN_HISTORY_DAYS: usize = 252;

/// Top-ranked rows that receive a narrative when a summarizer is configured
const SUMMARY_TOP_N: usize = 5;

/// Everything one screening run produces: the ranked table plus the full
/// diagnostic trail of what was excluded and why
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningOutcome {
    pub results: Vec<ScreeningResult>,
    pub price_issues: BTreeMap<String, PriceIssue>,
    pub fundamentals_issues: BTreeMap<String, FundamentalsIssues>,
    pub rs_issues: BTreeMap<String, RsIssue>,
    pub total_analyzed: usize,
    pub total_passed_filters: usize,
    pub timestamp: DateTime<Utc>,
}

impl ScreeningOutcome {
    /// Combined per-symbol diagnostics across all validation passes
    pub fn validation_report(&self) -> ValidationReport {
        ValidationReport::build(&self.price_issues, &self.fundamentals_issues, &self.rs_issues)
    }
}

/// Drives a full screening run: validate → momentum and quality engines →
/// join on symbol → filter, score, rank. Collaborators (cache, summarizer)
/// are injected explicitly; there is no process-wide state.
pub struct ScreeningOrchestrator {
    rs_config: RsConfig,
    quality_engine: QualityEngine,
    cache: Option<Arc<ScreenerCache>>,
    summarizer: Option<Box<dyn Summarizer>>,
}

impl ScreeningOrchestrator {
    pub fn new() -> Self {
        Self {
            rs_config: RsConfig::default(),
            quality_engine: QualityEngine::default(),
            cache: None,
            summarizer: None,
        }
    }

    pub fn with_rs_config(mut self, config: RsConfig) -> Self {
        self.rs_config = config;
        self
    }

    pub fn with_quality_config(mut self, config: QualityConfig) -> Self {
        self.quality_engine = QualityEngine::new(config);
        self
    }

    pub fn with_cache(mut self, cache: Arc<ScreenerCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Box<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Run a screening pass over already-fetched inputs. `as_of` anchors the
    /// staleness check; pass today's date in production, a fixed date in
    /// tests.
    pub fn run(
        &self,
        prices: HashMap<String, PriceSeries>,
        fundamentals: Vec<FundamentalsRecord>,
        benchmark: Option<&PriceSeries>,
        params: &ScreeningParams,
        as_of: NaiveDate,
    ) -> Result<ScreeningOutcome> {
        anyhow::ensure!(
            (0.0..=100.0).contains(&params.rs_threshold),
            "rs_threshold must be within 0-100, got {}",
            params.rs_threshold
        );
        anyhow::ensure!(params.max_results > 0, "max_results must be positive");

        let total_analyzed = prices.len();
        tracing::info!("📊 Starting screening run over {} symbols", total_analyzed);

        let key = screening_cache_key(&prices, params, as_of);
        if let Some(cache) = &self.cache {
            if let Some(outcome) =
                cache.get::<ScreeningOutcome>(&key, CacheCategory::Screening.ttl())
            {
                tracing::info!("Serving screening results from cache");
                return Ok(outcome);
            }
        }

        let (valid_prices, price_issues) = validate_prices(prices, MIN_HISTORY_DAYS, as_of);
        tracing::info!(
            "Price validation: {}/{} symbols usable",
            valid_prices.len(),
            total_analyzed
        );

        // Parallel per-symbol map; the percentile/rank reduce sees the full
        // validated snapshot fixed at engine construction
        let engine = RsEngine::new(valid_prices, self.rs_config.clone());
        let rs_rows = engine.compute_all(benchmark);
        let (rs_rows, rs_issues) = validate_rs(rs_rows);

        let (valid_fundamentals, fundamentals_issues) = validate_fundamentals(fundamentals);
        let quality_scores = self.quality_engine.score_all(&valid_fundamentals);
        let fundamentals_by_symbol: HashMap<String, FundamentalsRecord> = valid_fundamentals
            .into_iter()
            .map(|record| (record.symbol.clone(), record))
            .collect();

        let snapshots: Vec<StockSnapshot> = rs_rows
            .into_iter()
            .map(|rs| {
                let record = fundamentals_by_symbol.get(&rs.symbol);
                StockSnapshot {
                    symbol: rs.symbol.clone(),
                    sector: record.and_then(|r| r.sector.clone()),
                    quality: quality_scores.get(&rs.symbol).cloned(),
                    roe: record.and_then(|r| r.roe),
                    debt_equity: record.and_then(|r| r.debt_equity),
                    operating_margin: record.and_then(|r| r.operating_margin),
                    market_cap: record.and_then(|r| r.market_cap),
                    pe_ratio: record.and_then(|r| r.pe_ratio),
                    current_price: record.and_then(|r| r.current_price),
                    rs,
                }
            })
            .collect();

        let screener = ScreeningEngine::new(params.clone());
        let filtered = screener.apply_filters(snapshots);
        let mut results = screener.score(filtered);
        let total_passed_filters = results.len();
        results.truncate(params.max_results);

        self.attach_summaries(&mut results);

        let outcome = ScreeningOutcome {
            results,
            price_issues,
            fundamentals_issues,
            rs_issues,
            total_analyzed,
            total_passed_filters,
            timestamp: Utc::now(),
        };

        if let Some(cache) = &self.cache {
            cache.set(&key, &outcome);
        }

        tracing::info!(
            "✅ Screening complete: {}/{} symbols ranked",
            outcome.results.len(),
            total_analyzed
        );
        Ok(outcome)
    }

    /// Narratives for the top rows. A failing summarizer leaves a failure
    /// note behind and never touches scores or signals.
    fn attach_summaries(&self, results: &mut [ScreeningResult]) {
        let Some(summarizer) = &self.summarizer else {
            return;
        };
        for result in results.iter_mut().take(SUMMARY_TOP_N) {
            match summarizer.summarize(result) {
                Ok(text) => result.summary = Some(text),
                Err(e) => {
                    tracing::warn!("Summary failed for {}: {}", result.stock.symbol, e);
                    result.summary = Some(format!("Analysis failed: {e}"));
                }
            }
        }
    }
}

impl Default for ScreeningOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Content-hash key for a screening run: every parameter that can change the
/// output participates, including the universe itself
fn screening_cache_key(
    prices: &HashMap<String, PriceSeries>,
    params: &ScreeningParams,
    as_of: NaiveDate,
) -> String {
    let mut symbols: Vec<&str> = prices.keys().map(|s| s.as_str()).collect();
    symbols.sort();

    let key_params = [
        ("universe", symbols.join(",")),
        ("sector", params.sector.clone().unwrap_or_default()),
        ("strategy", params.strategy.as_str().to_string()),
        ("rs_threshold", format!("{}", params.rs_threshold)),
        ("min_roe", format!("{:?}", params.min_roe)),
        ("max_de", format!("{:?}", params.max_de)),
        ("min_margin", format!("{:?}", params.min_margin)),
        ("min_mcap", format!("{}", params.min_mcap)),
        ("max_results", format!("{}", params.max_results)),
        ("as_of", as_of.to_string()),
    ];
    cache_key(CacheCategory::Screening.prefix(), &key_params)
}
