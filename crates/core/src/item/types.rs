//! Core work item data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline state of a work item.
///
/// Transitions are monotonic along
/// `pending → editing → edited → processing_publish → uploaded`;
/// `failed` is reachable from any non-terminal state. `uploaded` and
/// `failed` are terminal and never exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Submitted, waiting for its edit job to be dequeued.
    Pending,
    /// Edit job running (at most one item at a time).
    Editing,
    /// Edited file staged remotely, waiting for a publish tick.
    Edited,
    /// Claimed by a publish tick (at most one item at a time).
    ProcessingPublish,
    /// Published successfully.
    Uploaded,
    /// Terminal failure; requires operator intervention to retry.
    Failed,
}

impl ItemState {
    /// Stable string form used in the database and in state filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Pending => "pending",
            ItemState::Editing => "editing",
            ItemState::Edited => "edited",
            ItemState::ProcessingPublish => "processing_publish",
            ItemState::Uploaded => "uploaded",
            ItemState::Failed => "failed",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ItemState::Pending),
            "editing" => Some(ItemState::Editing),
            "edited" => Some(ItemState::Edited),
            "processing_publish" => Some(ItemState::ProcessingPublish),
            "uploaded" => Some(ItemState::Uploaded),
            "failed" => Some(ItemState::Failed),
            _ => None,
        }
    }

    /// Terminal states are never exited.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Uploaded | ItemState::Failed)
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted clip and its pipeline metadata.
///
/// Items are never deleted; failed and uploaded items remain as an
/// audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    /// Opaque unique id, assigned at creation.
    pub id: String,
    /// Submitted file name, sanitized before use as a storage key.
    pub original_name: String,
    /// Title attached to the published artifact; derived from the file
    /// name at submission, never blank.
    pub title: String,
    /// Description attached to the published artifact.
    pub description: String,
    /// Current pipeline state.
    pub state: ItemState,
    /// Local path of the uploaded source file while an edit job owns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// Handle returned by the staging service; set when the edited file
    /// has been stored, cleared only after successful publication cleanup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_ref: Option<String>,
    /// Permanent public locator; populated only in `uploaded`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,
    /// Failure reason; populated only in `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Submitting principal, stored opaquely.
    pub owner: String,
    /// Submission timestamp; the sole FIFO ordering key. Set once.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new work item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub original_name: String,
    pub title: String,
    pub description: String,
    pub source_path: String,
    pub owner: String,
}

/// Sanitizes a submitted file name for use as a storage key: whitespace
/// becomes underscores and path separators or other unsafe characters
/// are dropped.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    if cleaned.is_empty() {
        "clip".to_string()
    } else {
        cleaned
    }
}

/// Derives a title from a file name: the stem, or the whole name when
/// there is no extension. Never blank.
pub fn derive_title(original_name: &str) -> String {
    let stem = std::path::Path::new(original_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if stem.trim().is_empty() {
        "Untitled clip".to_string()
    } else {
        stem
    }
}
