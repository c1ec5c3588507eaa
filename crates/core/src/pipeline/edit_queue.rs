//! Serial admission queue for edit jobs.
//!
//! Edits are CPU and disk bound, so they run strictly one at a time in
//! submission order. The queue is an in-process mechanism; it bounds
//! concurrency within one process instance only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::error::PipelineError;
use crate::metrics;

/// Handles one dequeued edit job.
#[async_trait]
pub trait EditJobHandler: Send + Sync {
    /// Processes the item with the given id. A returned error is the
    /// job's terminal outcome; it never stops the queue.
    async fn handle(&self, item_id: String) -> Result<(), PipelineError>;
}

/// Single-concurrency FIFO queue feeding a background worker task.
///
/// Depth counts queued plus currently running jobs; it is reported to
/// submitters so clients can see how far back in line they are.
pub struct EditQueue {
    tx: mpsc::UnboundedSender<String>,
    depth: Arc<AtomicUsize>,
}

impl EditQueue {
    /// Creates the queue and spawns its worker task.
    pub fn new(handler: Arc<dyn EditJobHandler>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let depth = Arc::new(AtomicUsize::new(0));

        let worker_depth = Arc::clone(&depth);
        tokio::spawn(async move {
            info!("Edit queue worker started");
            while let Some(item_id) = rx.recv().await {
                debug!(item_id = %item_id, "Edit job dequeued");
                if let Err(e) = handler.handle(item_id.clone()).await {
                    // The handler records the failure on the item; the
                    // queue just moves on to the next job.
                    error!(item_id = %item_id, "Edit job failed: {}", e);
                }
                worker_depth.fetch_sub(1, Ordering::SeqCst);
                metrics::EDIT_QUEUE_DEPTH.dec();
            }
            info!("Edit queue worker stopped");
        });

        Self { tx, depth }
    }

    /// Enqueues one item and returns the queue depth including it.
    pub fn submit(&self, item_id: String) -> Result<usize, PipelineError> {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::EDIT_QUEUE_DEPTH.inc();
        self.tx.send(item_id).map_err(|e| {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            metrics::EDIT_QUEUE_DEPTH.dec();
            PipelineError::InvalidSubmission(format!("Edit queue is closed: {}", e))
        })?;
        Ok(depth)
    }

    /// Current depth: queued plus running jobs.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}
