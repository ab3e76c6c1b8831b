//! Custom error types for scholarswipe.
//!
//! Every fallible operation returns `Result<T, SwipeError>`. Most pipeline
//! failures are recovered locally (see [`crate::pipeline`]); the variants that
//! reach callers are invalid input, strict-mode empty results and conclusion
//! failures.

use thiserror::Error;

/// Main error type for scholarswipe operations.
#[derive(Debug, Error)]
pub enum SwipeError {
    /// Caller supplied a blank topic or an empty paper list
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code from the API
        code: i32,
        /// Error message from the API
        message: String,
    },

    /// Model output could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// External call exceeded its deadline
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Strict mode: nothing usable came back for the topic
    #[error("No papers found for query: {0}")]
    NoPapers(String),

    /// Cross-paper conclusion could not be produced
    #[error("Failed to generate conclusion: {0}")]
    Conclusion(#[source] Box<SwipeError>),
}

impl SwipeError {
    /// True for the "bad request" class of errors, raised before any external call.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SwipeError::InvalidInput(_))
    }
}

/// Result type alias using `SwipeError`
pub type Result<T> = std::result::Result<T, SwipeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conclusion_wraps_source() {
        let err = SwipeError::Conclusion(Box::new(SwipeError::Timeout(60)));
        assert_eq!(
            err.to_string(),
            "Failed to generate conclusion: Request timed out after 60s"
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn test_invalid_input_signal() {
        assert!(SwipeError::InvalidInput("Query cannot be empty".into()).is_invalid_input());
        assert!(!SwipeError::NoPapers("x".into()).is_invalid_input());
    }
}
