//! Error types for the editor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while editing a clip.
///
/// All editor failures are terminal for the item; none are retried
/// automatically.
#[derive(Debug, Error)]
pub enum EditorError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Input duration could not be determined.
    #[error("Unsupported media: {reason}")]
    UnsupportedMedia { reason: String },

    /// Input is shorter than the configured trim offset.
    #[error("Input too short: {duration_secs}s leaves nothing after trimming {trim_secs}s")]
    InputTooShort { duration_secs: f64, trim_secs: f64 },

    /// A required static asset (watermark image or caption font) is
    /// missing. Checked before any transcoding work begins.
    #[error("Missing asset: {path}")]
    MissingAsset { path: PathBuf },

    /// The transform engine failed.
    #[error("Edit failed: {reason}")]
    EditFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Edit timed out.
    #[error("Edit timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to parse FFprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// I/O error during editing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    /// Creates a new edit failed error with stderr output.
    pub fn edit_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::EditFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new unsupported media error.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedMedia {
            reason: reason.into(),
        }
    }
}
