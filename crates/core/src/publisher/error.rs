//! Error types for the publisher module.

use thiserror::Error;

/// Errors from the remote publishing service.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Could not connect to the publishing service.
    #[error("Connection to publishing service failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Publish request timed out")]
    Timeout,

    /// Credentials rejected.
    #[error("Publish authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service rejected the upload content.
    #[error("Upload rejected: {0}")]
    Rejected(String),

    /// The service accepted the request but returned no usable locator.
    #[error("Publish response missing locator: {0}")]
    MissingLocator(String),

    /// Any other API-level failure.
    #[error("Publish API error: {0}")]
    ApiError(String),
}

impl PublishError {
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
