//! Error types for the pipeline module.

use thiserror::Error;

use crate::editor::EditorError;
use crate::item::StoreError;
use crate::publisher::PublishError;
use crate::staging::StagingError;

/// Errors from one item's pipeline job.
///
/// These are caught at the job boundary, recorded as the item's
/// terminal `failed` state, and never crash the process.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Edit error: {0}")]
    Edit(#[from] EditorError),

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Invalid schedule expression: {0}")]
    InvalidSchedule(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Short reason string recorded on the failed item.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}
