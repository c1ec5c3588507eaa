//! Item storage trait and query types.

use thiserror::Error;

use super::types::{ItemState, NewItem, WorkItem};

/// Error type for item store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Item not found.
    #[error("Item not found: {0}")]
    NotFound(String),

    /// Cannot perform the operation in the item's current state.
    #[error("Cannot {operation} item {item_id}: current state is {current_state}")]
    InvalidState {
        item_id: String,
        current_state: String,
        operation: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for querying items.
#[derive(Debug, Clone)]
pub struct ItemFilter {
    /// Filter by state.
    pub state: Option<ItemState>,
    /// Filter by owner.
    pub owner: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemFilter {
    pub fn new() -> Self {
        Self {
            state: None,
            owner: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_state(mut self, state: ItemState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Per-state item count, for the stats endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StateCount {
    pub state: ItemState,
    pub count: i64,
}

/// Uploaded-item count per owner, for the stats endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OwnerCount {
    pub owner: String,
    pub count: i64,
}

/// Trait for item storage backends.
///
/// Listing is always FIFO: `created_at` ascending with `id` as the
/// tie-breaker, so same-millisecond submissions keep a stable order.
pub trait ItemStore: Send + Sync {
    /// Create a new item in state `pending`.
    fn create(&self, request: NewItem) -> Result<WorkItem, StoreError>;

    /// Get an item by id.
    fn get(&self, id: &str) -> Result<Option<WorkItem>, StoreError>;

    /// List items matching the filter, FIFO.
    fn list(&self, filter: &ItemFilter) -> Result<Vec<WorkItem>, StoreError>;

    /// Count items matching the filter.
    fn count(&self, filter: &ItemFilter) -> Result<i64, StoreError>;

    /// Update an item's state. Rejects any transition out of a terminal
    /// state.
    fn update_state(&self, id: &str, new_state: ItemState) -> Result<WorkItem, StoreError>;

    /// Record the staging handle once the edited file has been stored.
    fn set_staging_ref(&self, id: &str, staging_ref: &str) -> Result<WorkItem, StoreError>;

    /// Record the public locator of a published item.
    fn set_published_url(&self, id: &str, url: &str) -> Result<WorkItem, StoreError>;

    /// Clear the local source path once the edit job has released its
    /// temporary files.
    fn clear_source_path(&self, id: &str) -> Result<WorkItem, StoreError>;

    /// Move an item to `failed` with a reason. No-op transition checks
    /// apply: a terminal item stays as it is.
    fn mark_failed(&self, id: &str, reason: &str) -> Result<WorkItem, StoreError>;

    /// Atomically claim the oldest `edited` item for publishing: select
    /// it and move it to `processing_publish` in a single indivisible
    /// store operation. Returns the post-update record, or `None` when
    /// no item is eligible (including when a concurrent claim won).
    fn claim_next_edited(&self) -> Result<Option<WorkItem>, StoreError>;

    /// Item counts grouped by state.
    fn counts_by_state(&self) -> Result<Vec<StateCount>, StoreError>;

    /// Uploaded-item counts grouped by owner.
    fn uploaded_counts_by_owner(&self) -> Result<Vec<OwnerCount>, StoreError>;
}
