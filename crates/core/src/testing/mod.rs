//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of the external service
//! traits, allowing comprehensive pipeline testing without ffmpeg or
//! real remote services.

mod mock_editor;
mod mock_publisher;
mod mock_staging;

pub use mock_editor::{MockEditor, RecordedEdit};
pub use mock_publisher::{MockPublisher, RecordedPublish};
pub use mock_staging::{MockStaging, StagingCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::editor::MediaInfo;
    use crate::item::NewItem;
    use std::path::Path;

    /// Create a probe result with the given duration and reasonable
    /// defaults for everything else.
    pub fn media_info(path: impl AsRef<Path>, duration_secs: f64) -> MediaInfo {
        MediaInfo {
            path: path.as_ref().to_path_buf(),
            size_bytes: 10 * 1024 * 1024,
            duration_secs,
            format: "mp4".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(1080),
            video_height: Some(1920),
            audio_codec: Some("aac".to_string()),
        }
    }

    /// Create a new-item request with reasonable defaults.
    pub fn new_item(name: &str, owner: &str) -> NewItem {
        NewItem {
            original_name: name.to_string(),
            title: crate::item::derive_title(name),
            description: "Test clip".to_string(),
            source_path: format!("/tmp/{}", name),
            owner: owner.to_string(),
        }
    }
}
