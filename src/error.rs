use serde::Serialize;
use thiserror::Error;

/// Unified error type for the coindash application.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Insufficient samples: need at least {required} price points, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("No results returned")]
    NoResults,
}

pub type Result<T> = std::result::Result<T, Error>;

/// A fetch that failed without aborting the surrounding view.
///
/// Views collect these instead of returning early so that sibling coins still
/// render; every recorded failure is shown to the user as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    /// Coin id or other subject of the failed call.
    pub subject: String,
    /// Client operation that failed, e.g. `market_chart`.
    pub operation: String,
    pub message: String,
}

impl FetchFailure {
    pub fn new(subject: impl Into<String>, operation: impl Into<String>, err: &Error) -> Self {
        Self {
            subject: subject.into(),
            operation: operation.into(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed for '{}': {}",
            self.operation, self.subject, self.message
        )
    }
}
