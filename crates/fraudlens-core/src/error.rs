//! Centralized error types for FraudLens.

use thiserror::Error;

/// Every way a single analysis can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid request: {0}")]
    InputValidation(String),

    #[error("Image decoding failed: {0}")]
    InputDecoding(String),

    #[error("Web scraping failed: {0}")]
    Fetch(String),

    #[error("Fetching {0} is disallowed by robots.txt")]
    RobotsDisallowed(String),

    #[error("Provider analysis failed: {0}")]
    Provider(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::InputValidation(msg.into())
    }

    /// Create a decoding error.
    pub fn decoding(msg: impl Into<String>) -> Self {
        Self::InputDecoding(msg.into())
    }

    /// Create a fetch error.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a provider error.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// True when the caller's input caused the failure (HTTP 400 class).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InputValidation(_)
                | Self::InputDecoding(_)
                | Self::Fetch(_)
                | Self::RobotsDisallowed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(AnalysisError::validation("x").is_client_error());
        assert!(AnalysisError::decoding("x").is_client_error());
        assert!(AnalysisError::fetch("x").is_client_error());
        assert!(AnalysisError::RobotsDisallowed("https://a.example".into()).is_client_error());
        assert!(!AnalysisError::provider("x").is_client_error());
        assert!(!AnalysisError::Unexpected("x".into()).is_client_error());
    }

    #[test]
    fn test_messages_never_empty() {
        let errors = [
            AnalysisError::validation(""),
            AnalysisError::decoding(""),
            AnalysisError::fetch(""),
            AnalysisError::RobotsDisallowed(String::new()),
            AnalysisError::provider(""),
            AnalysisError::Unexpected(String::new()),
        ];
        for e in errors {
            assert!(!e.to_string().trim().is_empty());
        }
    }

    #[test]
    fn test_robots_message_mentions_disallowed() {
        let e = AnalysisError::RobotsDisallowed("https://blocked.example".into());
        assert!(e.to_string().contains("disallowed"));
    }
}
