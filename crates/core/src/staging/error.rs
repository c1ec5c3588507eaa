//! Error types for the staging module.

use thiserror::Error;

/// Errors from the remote staging service.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Could not connect to the staging service.
    #[error("Connection to staging service failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Staging request timed out")]
    Timeout,

    /// Credentials rejected.
    #[error("Staging authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The referenced object does not exist.
    #[error("Staged object not found: {0}")]
    NotFound(String),

    /// Any other API-level failure.
    #[error("Staging API error: {0}")]
    ApiError(String),

    /// Local file error while uploading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StagingError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::ConnectionFailed(e.to_string())
        } else {
            Self::ApiError(e.to_string())
        }
    }
}
