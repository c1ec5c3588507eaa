//! Pipeline orchestrator implementation.
//!
//! Drives items through the state machine:
//! - Submission: persist the item, enqueue its edit job
//! - Edit: serial (one item at a time), local transform + remote stage
//! - Publish: one item per trigger firing, claimed atomically

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::edit_queue::{EditJobHandler, EditQueue};
use super::error::PipelineError;
use crate::editor::{EditJob, Editor};
use crate::item::{sanitize_name, derive_title, ItemFilter, ItemState, ItemStore, NewItem, OwnerCount, StateCount, WorkItem};
use crate::metrics;
use crate::publisher::{PublishMetadata, PublishingService, Visibility};
use crate::staging::StagingService;

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scoped directory for temporary files. Everything created here is
    /// removed on every exit path of the job that created it.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Description attached to published clips.
    #[serde(default = "default_description")]
    pub default_description: String,

    /// Visibility of published clips.
    #[serde(default)]
    pub visibility: Visibility,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("work")
}

fn default_description() -> String {
    "Follow for more daily clips! #shorts".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            default_description: default_description(),
            visibility: Visibility::default(),
        }
    }
}

/// One accepted submission.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Client-supplied file name.
    pub original_name: String,
    /// Submitting principal.
    pub owner: String,
    /// File content.
    pub data: Bytes,
}

/// Result of an accepted submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub item: WorkItem,
    /// Edit queue depth including this item.
    pub pending_edits: usize,
}

/// Outcome of one publish trigger firing.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// One item was claimed and published.
    Published(WorkItem),
    /// No `edited` item existed.
    NothingEligible,
    /// No `edited` item existed but a publish is in flight elsewhere.
    PublishInFlight,
    /// An item was claimed but its publish failed; it is now `failed`
    /// and its staged copy is left in place for recovery.
    Failed { item_id: String, reason: String },
}

/// Aggregate counts for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub by_state: Vec<StateCount>,
    pub uploaded_by_owner: Vec<OwnerCount>,
    pub pending_edits: usize,
}

/// Removes a temp file, logging failures instead of propagating them.
async fn remove_file_quiet(path: &PathBuf) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "Failed to remove temp file: {}", e);
        }
    }
}

/// Handles dequeued edit jobs: transform locally, stage remotely.
struct EditWorker {
    store: Arc<dyn ItemStore>,
    editor: Arc<dyn Editor>,
    staging: Arc<dyn StagingService>,
    work_dir: PathBuf,
}

impl EditWorker {
    async fn run(&self, item_id: &str) -> Result<(), PipelineError> {
        let item = self
            .store
            .get(item_id)?
            .ok_or_else(|| PipelineError::InvalidSubmission(format!("Unknown item {}", item_id)))?;

        let input_path = PathBuf::from(item.source_path.clone().ok_or_else(|| {
            PipelineError::InvalidSubmission(format!("Item {} has no source file", item_id))
        })?);
        let output_path = self
            .work_dir
            .join("edited")
            .join(format!("{}.mp4", item.id));

        let result = self.edit_and_stage(&item, &input_path, &output_path).await;

        // Temp files go away on every exit path, whatever happened
        // downstream.
        remove_file_quiet(&input_path).await;
        remove_file_quiet(&output_path).await;
        if let Err(e) = self.store.clear_source_path(item_id) {
            warn!(item_id, "Failed to clear source path: {}", e);
        }

        result
    }

    async fn edit_and_stage(
        &self,
        item: &WorkItem,
        input_path: &PathBuf,
        output_path: &PathBuf,
    ) -> Result<(), PipelineError> {
        let start = Instant::now();
        self.store.update_state(&item.id, ItemState::Editing)?;

        let edit_result = self
            .editor
            .edit(EditJob {
                item_id: item.id.clone(),
                input_path: input_path.clone(),
                output_path: output_path.clone(),
            })
            .await?;

        debug!(
            item_id = %item.id,
            size = edit_result.output_size_bytes,
            elapsed_ms = edit_result.elapsed_ms,
            "Edit complete, staging"
        );

        let staging_name = format!("{}_{}", item.id, sanitize_name(&item.original_name));
        let staging_ref = self.staging.put(output_path, &staging_name).await;
        record_external("staging", "put", staging_ref.is_ok());
        let staging_ref = staging_ref?;

        self.store.set_staging_ref(&item.id, &staging_ref)?;
        self.store.update_state(&item.id, ItemState::Edited)?;

        metrics::EDIT_DURATION.observe(start.elapsed().as_secs_f64());
        info!(item_id = %item.id, staging_ref = %staging_ref, "Item edited and staged");
        Ok(())
    }
}

#[async_trait]
impl EditJobHandler for EditWorker {
    async fn handle(&self, item_id: String) -> Result<(), PipelineError> {
        let result = self.run(&item_id).await;
        match &result {
            Ok(()) => {
                metrics::EDITS_TOTAL.with_label_values(&["success"]).inc();
            }
            Err(e) => {
                metrics::EDITS_TOTAL.with_label_values(&["failed"]).inc();
                if let Err(store_err) = self.store.mark_failed(&item_id, &e.reason()) {
                    error!(item_id, "Failed to record edit failure: {}", store_err);
                }
            }
        }
        result
    }
}

/// The pipeline orchestrator.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    store: Arc<dyn ItemStore>,
    staging: Arc<dyn StagingService>,
    publisher: Arc<dyn PublishingService>,
    edit_queue: EditQueue,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator. Spawns the edit queue worker.
    pub fn new(
        config: PipelineConfig,
        store: Arc<dyn ItemStore>,
        editor: Arc<dyn Editor>,
        staging: Arc<dyn StagingService>,
        publisher: Arc<dyn PublishingService>,
    ) -> Self {
        let worker = Arc::new(EditWorker {
            store: Arc::clone(&store),
            editor,
            staging: Arc::clone(&staging),
            work_dir: config.work_dir.clone(),
        });

        Self {
            config,
            store,
            staging,
            publisher,
            edit_queue: EditQueue::new(worker),
        }
    }

    /// Accept one submission: persist the source file and item, enqueue
    /// the edit job.
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitOutcome, PipelineError> {
        if request.data.is_empty() {
            return Err(PipelineError::InvalidSubmission(
                "No file supplied".to_string(),
            ));
        }

        let sanitized = sanitize_name(&request.original_name);
        let incoming = self.config.work_dir.join("incoming");
        tokio::fs::create_dir_all(&incoming).await?;
        let source_path = incoming.join(format!("{}_{}", uuid::Uuid::new_v4(), sanitized));
        tokio::fs::write(&source_path, &request.data).await?;

        let item = match self.store.create(NewItem {
            original_name: request.original_name.clone(),
            title: derive_title(&request.original_name),
            description: self.config.default_description.clone(),
            source_path: source_path.to_string_lossy().to_string(),
            owner: request.owner,
        }) {
            Ok(item) => item,
            Err(e) => {
                remove_file_quiet(&source_path).await;
                return Err(e.into());
            }
        };

        let pending_edits = match self.edit_queue.submit(item.id.clone()) {
            Ok(depth) => depth,
            Err(e) => {
                let _ = self.store.mark_failed(&item.id, &e.reason());
                remove_file_quiet(&source_path).await;
                return Err(e);
            }
        };

        metrics::ITEMS_SUBMITTED.inc();
        info!(item_id = %item.id, pending_edits, "Item submitted");
        Ok(SubmitOutcome { item, pending_edits })
    }

    /// One publish trigger firing: atomically claim the oldest `edited`
    /// item and publish it.
    ///
    /// Re-entrant safe: under concurrent firings only one can claim any
    /// given item; the others observe nothing eligible.
    pub async fn publish_tick(&self) -> Result<TickOutcome, PipelineError> {
        let claimed = match self.store.claim_next_edited()? {
            Some(item) => item,
            None => {
                // Operability only: say whether we lost to an in-flight
                // publish or there was simply nothing to do.
                let in_flight = self
                    .store
                    .count(&ItemFilter::new().with_state(ItemState::ProcessingPublish))
                    .unwrap_or(0);
                return Ok(if in_flight > 0 {
                    metrics::PUBLISH_TICKS.with_label_values(&["in_flight"]).inc();
                    debug!("Publish tick: another publish already in flight");
                    TickOutcome::PublishInFlight
                } else {
                    metrics::PUBLISH_TICKS
                        .with_label_values(&["nothing_eligible"])
                        .inc();
                    debug!("Publish tick: nothing eligible");
                    TickOutcome::NothingEligible
                });
            }
        };

        info!(item_id = %claimed.id, "Publish tick: claimed item");

        match self.publish_claimed(&claimed).await {
            Ok(item) => {
                metrics::PUBLISH_TICKS.with_label_values(&["published"]).inc();
                metrics::ITEMS_UPLOADED.inc();
                Ok(TickOutcome::Published(item))
            }
            Err(e) => {
                let reason = e.reason();
                error!(item_id = %claimed.id, "Publish failed: {}", reason);
                metrics::PUBLISH_TICKS.with_label_values(&["failed"]).inc();
                if let Err(store_err) = self.store.mark_failed(&claimed.id, &reason) {
                    error!(item_id = %claimed.id, "Failed to record publish failure: {}", store_err);
                }
                // The staged copy is deliberately left in place so the
                // content survives until an operator recovers it.
                Ok(TickOutcome::Failed {
                    item_id: claimed.id.clone(),
                    reason,
                })
            }
        }
    }

    async fn publish_claimed(&self, item: &WorkItem) -> Result<WorkItem, PipelineError> {
        let start = Instant::now();
        let staging_ref = item.staging_ref.clone().ok_or_else(|| {
            PipelineError::InvalidSubmission(format!("Item {} has no staging ref", item.id))
        })?;

        let stream = self.staging.get_stream(&staging_ref).await;
        record_external("staging", "get_stream", stream.is_ok());
        let stream = stream?;

        let metadata = PublishMetadata {
            title: item.title.clone(),
            description: item.description.clone(),
            visibility: self.config.visibility,
        };

        let url = self.publisher.insert(metadata, stream).await;
        record_external("publisher", "insert", url.is_ok());
        let url = url?;

        self.store.set_published_url(&item.id, &url)?;
        let updated = self.store.update_state(&item.id, ItemState::Uploaded)?;

        // Best-effort cleanup: a failed delete only leaks storage.
        let delete_result = self.staging.delete(&staging_ref).await;
        record_external("staging", "delete", delete_result.is_ok());
        if let Err(e) = delete_result {
            warn!(item_id = %item.id, staging_ref = %staging_ref, "Failed to delete staged copy: {}", e);
        }

        metrics::PUBLISH_DURATION.observe(start.elapsed().as_secs_f64());
        info!(item_id = %item.id, url = %url, "Item published");
        Ok(updated)
    }

    /// Aggregate counts for the stats endpoint.
    pub fn stats(&self) -> Result<PipelineStats, PipelineError> {
        Ok(PipelineStats {
            by_state: self.store.counts_by_state()?,
            uploaded_by_owner: self.store.uploaded_counts_by_owner()?,
            pending_edits: self.edit_queue.depth(),
        })
    }

    /// Current edit queue depth.
    pub fn pending_edits(&self) -> usize {
        self.edit_queue.depth()
    }
}

fn record_external(service: &str, operation: &str, ok: bool) {
    metrics::EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, if ok { "success" } else { "error" }])
        .inc();
}
