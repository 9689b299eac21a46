use screener_core::{ScreenerError, ScreeningResult};

/// Optional collaborator that turns a ranked row into a short narrative.
/// The pipeline must produce identical scores and signals with or without
/// one wired in; only the `summary` field may differ.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, result: &ScreeningResult) -> Result<String, ScreenerError>;
}
