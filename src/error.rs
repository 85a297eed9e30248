//! Error types for each stage of a translation session

use std::time::Duration;
use thiserror::Error;

/// Screen capture errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no outputs available to capture")]
    NoOutputs,

    #[error("screencopy failed: {0}")]
    Screencopy(String),

    #[error("invalid capture buffer: {0}")]
    Buffer(String),
}

/// Text recognition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("recognition timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("{0}")]
    Engine(String),

    #[error("could not prepare image: {0}")]
    Image(String),

    #[error("recognition engine unavailable: {0}")]
    Unavailable(String),
}

/// Translation service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("network error: {0}")]
    Network(String),

    #[error("service returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("service returned no translation")]
    Empty,
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TranslationError::Parse(err.to_string())
        } else {
            TranslationError::Network(err.to_string())
        }
    }
}

/// Command line and environment configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing value for {0}")]
    MissingValue(String),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_uses_seconds() {
        let err = RecognitionError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "recognition timed out after 5s");
    }

    #[test]
    fn test_status_message() {
        let err = TranslationError::Status {
            code: 429,
            body: "Too Many Requests".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "service returned status 429: Too Many Requests"
        );
    }
}
