use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Summary unavailable: {0}")]
    SummaryUnavailable(String),
}
