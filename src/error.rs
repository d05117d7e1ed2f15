use thiserror::Error;

/// Failures that abort a whole report run.
///
/// Numeric anomalies (zero denominators, infinite growth) are never errors;
/// they are rendered as sentinel cells instead.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Column '{column}' configured for {role} is not present in the input")]
    MissingColumn { role: String, column: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
