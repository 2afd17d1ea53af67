//! Error types for tubetech core
//!
//! Playback commands never fail: backend failures are latched on the tech and
//! surfaced through [`crate::MediaError`]. This type only covers the fallible
//! setup paths (option parsing, embed host resolution).

use thiserror::Error;

/// Result type alias for tech setup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Tech setup error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Failed to parse options: {0}")]
    OptionsParse(#[from] serde_json::Error),

    #[error("Invalid embed host: {0}")]
    InvalidHost(#[from] url::ParseError),

    #[error("Invalid tech state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
}

impl Error {
    /// Returns the error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidOptions(_) => "INVALID_OPTIONS",
            Error::OptionsParse(_) => "OPTIONS_PARSE",
            Error::InvalidHost(_) => "INVALID_HOST",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Error::InvalidOptions("volume".into());
        assert_eq!(err.error_code(), "INVALID_OPTIONS");
        assert_eq!(err.to_string(), "Invalid options: volume");

        let err = Error::InvalidStateTransition {
            from: "disposed".into(),
            to: "ready".into(),
        };
        assert_eq!(err.error_code(), "INVALID_STATE");
        assert!(err.to_string().contains("disposed -> ready"));
    }
}
