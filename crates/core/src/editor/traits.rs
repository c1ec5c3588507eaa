//! Trait definitions for the editor module.

use async_trait::async_trait;
use std::path::Path;

use super::error::EditorError;
use super::types::{EditJob, EditResult, MediaInfo};

/// An editor that applies the fixed trim + overlay transform to a
/// local clip.
///
/// Editors perform no network I/O and no store mutation; they are pure
/// local file transforms.
#[async_trait]
pub trait Editor: Send + Sync {
    /// Returns the name of this editor implementation.
    fn name(&self) -> &str;

    /// Probes a media file for its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, EditorError>;

    /// Edits a clip according to the job specification.
    ///
    /// On success the output file exists and is non-empty, truncated to
    /// the input duration minus the configured trim offset, with the
    /// watermark and caption composited in.
    async fn edit(&self, job: EditJob) -> Result<EditResult, EditorError>;

    /// Validates that the editor is properly configured and ready.
    async fn validate(&self) -> Result<(), EditorError>;
}
