use thiserror::Error;

/// Message shown when a failed response carries no usable `error` field.
pub const FALLBACK_ERROR: &str = "Backtesting failed";

/// Failures at the backtest service boundary. `Display` is the text shown to
/// the user.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Non-success status; carries the service's own message or the fallback.
    #[error("{0}")]
    Service(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl BacktestError {
    /// Build a service error from an optional message, falling back to the
    /// generic text when it is missing or blank.
    pub fn service(message: Option<String>) -> Self {
        match message {
            Some(m) if !m.trim().is_empty() => BacktestError::Service(m),
            _ => BacktestError::Service(FALLBACK_ERROR.to_string()),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, BacktestError::MalformedResponse(_))
    }
}
