pub mod fundamentals;
pub mod prices;
pub mod report;
pub mod rs_rows;

pub use fundamentals::{validate_fundamentals, FundamentalsIssues, MIN_VALID_METRICS};
pub use prices::{validate_prices, PriceIssue};
pub use report::{data_quality_grade, data_quality_score, ValidationReport, ValidationReportRow};
pub use rs_rows::{validate_rs, RsIssue, MAX_VOLATILITY_PCT};
