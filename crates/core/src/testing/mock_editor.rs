//! Mock editor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::editor::{EditJob, EditResult, Editor, EditorError, MediaInfo};

/// A recorded edit job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedEdit {
    /// The job that was submitted.
    pub job: EditJob,
    /// Whether the edit succeeded.
    pub success: bool,
}

/// Mock implementation of the Editor trait.
///
/// Provides controllable behavior for testing:
/// - Track edit jobs for assertions
/// - Simulate success/failure
/// - Control probe results
/// - Simulate edit duration (for serialization tests)
pub struct MockEditor {
    /// Recorded edits.
    edits: Arc<RwLock<Vec<RecordedEdit>>>,
    /// Pre-configured probe results by path.
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    /// If set, the next edit will fail with this error.
    next_error: Arc<RwLock<Option<EditorError>>>,
    /// Simulated edit duration in milliseconds.
    edit_duration_ms: Arc<RwLock<u64>>,
    /// Default duration for probing unknown files.
    default_duration_secs: Arc<RwLock<f64>>,
}

impl Default for MockEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEditor {
    /// Create a new mock editor.
    pub fn new() -> Self {
        Self {
            edits: Arc::new(RwLock::new(Vec::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            edit_duration_ms: Arc::new(RwLock::new(0)),
            default_duration_secs: Arc::new(RwLock::new(30.0)),
        }
    }

    /// Get all recorded edits.
    pub async fn recorded_edits(&self) -> Vec<RecordedEdit> {
        self.edits.read().await.clone()
    }

    /// Get the number of edits performed.
    pub async fn edit_count(&self) -> usize {
        self.edits.read().await.len()
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe_result(&self, path: impl AsRef<Path>, info: MediaInfo) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), info);
    }

    /// Set the duration reported for unknown files.
    pub async fn set_default_duration(&self, duration_secs: f64) {
        *self.default_duration_secs.write().await = duration_secs;
    }

    /// Configure the next edit to fail with the given error.
    pub async fn set_next_error(&self, error: EditorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated edit duration.
    pub async fn set_edit_duration(&self, duration: Duration) {
        *self.edit_duration_ms.write().await = duration.as_millis() as u64;
    }

    async fn take_error(&self) -> Option<EditorError> {
        self.next_error.write().await.take()
    }

    async fn default_info(&self, path: &Path) -> MediaInfo {
        MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 10 * 1024 * 1024,
            duration_secs: *self.default_duration_secs.read().await,
            format: "mp4".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(1080),
            video_height: Some(1920),
            audio_codec: Some("aac".to_string()),
        }
    }
}

#[async_trait]
impl Editor for MockEditor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, EditorError> {
        if let Some(info) = self.probe_results.read().await.get(path) {
            return Ok(info.clone());
        }
        Ok(self.default_info(path).await)
    }

    async fn edit(&self, job: EditJob) -> Result<EditResult, EditorError> {
        if let Some(err) = self.take_error().await {
            self.edits.write().await.push(RecordedEdit {
                job,
                success: false,
            });
            return Err(err);
        }

        let duration_ms = *self.edit_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        // Produce a real (tiny) output file so cleanup paths have
        // something to delete.
        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&job.output_path, b"edited").await?;

        let info = self.probe(&job.input_path).await?;

        self.edits.write().await.push(RecordedEdit {
            job: job.clone(),
            success: true,
        });

        Ok(EditResult {
            item_id: job.item_id,
            output_path: job.output_path,
            output_size_bytes: 6,
            target_duration_secs: (info.duration_secs - 4.5).max(0.1),
            elapsed_ms: duration_ms,
        })
    }

    async fn validate(&self) -> Result<(), EditorError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }
}
