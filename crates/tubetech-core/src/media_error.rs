//! Translation of embed player error codes into host media errors

use serde::{Deserialize, Serialize};

/// Offset applied to backend codes so they never collide with the host's own
/// media error codes (1-4).
pub const ERROR_CODE_OFFSET: i32 = 1000;

/// Error categories the embed player can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    /// HTML5 player failure (code 5)
    PlaybackFailed,
    /// Invalid parameter or removed/private video (2, 100)
    NotFound,
    /// Embedding disallowed by the owner (101, 150)
    DisabledByOwner,
    Unknown,
}

impl BackendErrorKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            5 => BackendErrorKind::PlaybackFailed,
            2 | 100 => BackendErrorKind::NotFound,
            101 | 150 => BackendErrorKind::DisabledByOwner,
            _ => BackendErrorKind::Unknown,
        }
    }
}

/// Error as reported to the host player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaError {
    pub code: i32,
    pub message: String,
    #[serde(skip)]
    pub kind: Option<BackendErrorKind>,
}

impl MediaError {
    /// Translate a backend error code
    pub fn from_backend(code: i32) -> Self {
        let kind = BackendErrorKind::from_code(code);
        let message = match kind {
            BackendErrorKind::PlaybackFailed => "Error while trying to play the video".to_string(),
            BackendErrorKind::NotFound => "Unable to find the video".to_string(),
            BackendErrorKind::DisabledByOwner => {
                "Playback on other Websites has been disabled by the video owner.".to_string()
            }
            BackendErrorKind::Unknown => format!("YouTube unknown error ({})", code),
        };

        Self {
            code: ERROR_CODE_OFFSET.saturating_add(code),
            message,
            kind: Some(kind),
        }
    }

    /// The backend code this error was translated from
    pub fn backend_code(&self) -> i32 {
        self.code.saturating_sub(ERROR_CODE_OFFSET)
    }
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}
