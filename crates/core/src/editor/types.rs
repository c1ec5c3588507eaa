//! Data types for the editor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Probed information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path of the probed file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Total duration in seconds; 0.0 when it could not be determined.
    pub duration_secs: f64,
    /// Container format name.
    pub format: String,
    /// Video codec, if a video stream is present.
    pub video_codec: Option<String>,
    /// Video width in pixels.
    pub video_width: Option<u32>,
    /// Video height in pixels.
    pub video_height: Option<u32>,
    /// Audio codec, if an audio stream is present.
    pub audio_codec: Option<String>,
}

/// One edit job: transform `input_path` into `output_path`.
#[derive(Debug, Clone)]
pub struct EditJob {
    /// Id of the work item this job belongs to (for logging).
    pub item_id: String,
    /// Local source file.
    pub input_path: PathBuf,
    /// Local destination file; created by the editor.
    pub output_path: PathBuf,
}

/// Result of a successful edit.
#[derive(Debug, Clone)]
pub struct EditResult {
    pub item_id: String,
    /// The produced file; exists and is non-empty.
    pub output_path: PathBuf,
    /// Size of the produced file in bytes.
    pub output_size_bytes: u64,
    /// Duration the output was truncated to, in seconds.
    pub target_duration_secs: f64,
    /// Wall-clock time spent editing, in milliseconds.
    pub elapsed_ms: u64,
}
