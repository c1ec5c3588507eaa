//! Pipeline lifecycle integration tests.
//!
//! These tests verify the complete item lifecycle through the
//! orchestrator with mock editor, staging and publisher:
//! pending -> editing -> edited -> processing_publish -> uploaded,
//! plus the failure paths and the atomic publish claim.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tempfile::TempDir;

use cliprelay_core::{
    item::{ItemState, ItemStore, NewItem, SqliteItemStore},
    pipeline::{PipelineConfig, PipelineOrchestrator, SubmitRequest, TickOutcome},
    testing::{MockEditor, MockPublisher, MockStaging, StagingCall},
};

/// Test helper wiring the orchestrator to mocks and a temp work dir.
struct TestHarness {
    store: Arc<SqliteItemStore>,
    editor: Arc<MockEditor>,
    staging: Arc<MockStaging>,
    publisher: Arc<MockPublisher>,
    orchestrator: Arc<PipelineOrchestrator>,
    work_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let work_dir = temp_dir.path().join("work");

        let store = Arc::new(SqliteItemStore::in_memory().expect("Failed to create store"));
        let editor = Arc::new(MockEditor::new());
        let staging = Arc::new(MockStaging::new());
        let publisher = Arc::new(MockPublisher::new());

        let orchestrator = Arc::new(PipelineOrchestrator::new(
            PipelineConfig {
                work_dir: work_dir.clone(),
                ..Default::default()
            },
            store.clone(),
            editor.clone(),
            staging.clone(),
            publisher.clone(),
        ));

        Self {
            store,
            editor,
            staging,
            publisher,
            orchestrator,
            work_dir,
            _temp_dir: temp_dir,
        }
    }

    async fn submit(&self, name: &str) -> String {
        let outcome = self
            .orchestrator
            .submit(SubmitRequest {
                original_name: name.to_string(),
                owner: "tester".to_string(),
                data: Bytes::from_static(b"fake video bytes"),
            })
            .await
            .expect("submit failed");
        outcome.item.id
    }

    /// Poll until the item reaches the given state.
    async fn wait_for_state(&self, item_id: &str, state: ItemState) {
        for _ in 0..400 {
            let item = self.store.get(item_id).unwrap().unwrap();
            if item.state == state {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let item = self.store.get(item_id).unwrap().unwrap();
        panic!(
            "item {} never reached {}, stuck in {}",
            item_id, state, item.state
        );
    }

    /// Files remaining under the scoped work directory.
    fn leftover_temp_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for sub in ["incoming", "edited"] {
            let dir = self.work_dir.join(sub);
            if let Ok(entries) = std::fs::read_dir(&dir) {
                for entry in entries.flatten() {
                    files.push(entry.path());
                }
            }
        }
        files
    }

    /// Create an item already in `edited` state with a staged object,
    /// bypassing the edit queue.
    async fn seed_edited_item(&self, name: &str) -> String {
        let item = self
            .store
            .create(NewItem {
                original_name: name.to_string(),
                title: name.to_string(),
                description: "seeded".to_string(),
                source_path: format!("/tmp/{}", name),
                owner: "tester".to_string(),
            })
            .unwrap();
        let staging_ref = format!("{}_{}", item.id, name);
        self.staging
            .insert_object(&staging_ref, b"staged bytes".to_vec())
            .await;
        self.store
            .update_state(&item.id, ItemState::Editing)
            .unwrap();
        self.store.set_staging_ref(&item.id, &staging_ref).unwrap();
        self.store
            .update_state(&item.id, ItemState::Edited)
            .unwrap();
        item.id
    }
}

#[tokio::test]
async fn test_full_lifecycle_to_uploaded() {
    let h = TestHarness::new();

    let item_id = h.submit("great clip.mp4").await;
    h.wait_for_state(&item_id, ItemState::Edited).await;

    let item = h.store.get(&item_id).unwrap().unwrap();
    let staging_ref = item.staging_ref.clone().expect("staging ref missing");
    assert!(h.staging.contains(&staging_ref).await);
    assert_eq!(item.title, "great clip");

    let outcome = h.orchestrator.publish_tick().await.unwrap();
    let published = match outcome {
        TickOutcome::Published(item) => item,
        other => panic!("expected Published, got {:?}", other),
    };

    assert_eq!(published.id, item_id);
    assert_eq!(published.state, ItemState::Uploaded);
    assert!(published.published_url.is_some());

    // Staged copy is deleted after a successful publish.
    assert!(!h.staging.contains(&staging_ref).await);
    assert_eq!(h.publisher.publish_count().await, 1);

    // No temp files left behind.
    assert!(h.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn test_edit_failure_is_terminal_and_skips_staging() {
    let h = TestHarness::new();
    h.editor
        .set_next_error(cliprelay_core::EditorError::InputTooShort {
            duration_secs: 3.0,
            trim_secs: 4.5,
        })
        .await;

    let item_id = h.submit("short.mp4").await;
    h.wait_for_state(&item_id, ItemState::Failed).await;

    let item = h.store.get(&item_id).unwrap().unwrap();
    assert!(item.error.unwrap().contains("too short"));
    assert!(item.staging_ref.is_none());

    // No staging call happened at all.
    let calls = h.staging.recorded_calls().await;
    assert!(!calls.iter().any(|c| matches!(c, StagingCall::Put { .. })));

    // Temp files are removed on the failure path too.
    assert!(h.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn test_failed_edit_does_not_block_queue() {
    let h = TestHarness::new();
    h.editor
        .set_next_error(cliprelay_core::EditorError::unsupported("bad codec"))
        .await;

    let first = h.submit("broken.mp4").await;
    let second = h.submit("fine.mp4").await;

    h.wait_for_state(&first, ItemState::Failed).await;
    h.wait_for_state(&second, ItemState::Edited).await;
}

#[tokio::test]
async fn test_concurrent_submissions_edit_serially_in_order() {
    let h = TestHarness::new();
    h.editor.set_edit_duration(Duration::from_millis(20)).await;

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(h.submit(&format!("clip{}.mp4", i)).await);
    }

    // All ids are distinct.
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());

    for id in &ids {
        h.wait_for_state(id, ItemState::Edited).await;
    }

    let edits = h.editor.recorded_edits().await;
    let edited_ids: Vec<String> = edits.iter().map(|e| e.job.item_id.clone()).collect();
    assert_eq!(edited_ids, ids);
}

#[tokio::test]
async fn test_publish_tick_with_nothing_eligible() {
    let h = TestHarness::new();
    let outcome = h.orchestrator.publish_tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::NothingEligible));
    assert_eq!(h.publisher.publish_count().await, 0);
}

#[tokio::test]
async fn test_concurrent_ticks_claim_exactly_once() {
    let h = TestHarness::new();
    h.seed_edited_item("contested.mp4").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let orchestrator = Arc::clone(&h.orchestrator);
        handles.push(tokio::spawn(
            async move { orchestrator.publish_tick().await },
        ));
    }

    let mut published = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            TickOutcome::Published(_) => published += 1,
            TickOutcome::NothingEligible | TickOutcome::PublishInFlight => {}
            TickOutcome::Failed { reason, .. } => panic!("unexpected failure: {}", reason),
        }
    }

    assert_eq!(published, 1);
    assert_eq!(h.publisher.publish_count().await, 1);
}

#[tokio::test]
async fn test_publish_failure_keeps_staged_copy() {
    let h = TestHarness::new();
    let item_id = h.seed_edited_item("doomed.mp4").await;
    h.publisher
        .set_next_error(cliprelay_core::PublishError::Rejected(
            "quota exceeded".to_string(),
        ))
        .await;

    let outcome = h.orchestrator.publish_tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Failed { .. }));

    let item = h.store.get(&item_id).unwrap().unwrap();
    assert_eq!(item.state, ItemState::Failed);
    assert!(item.published_url.is_none());

    // The staged copy is left in place for recovery.
    let staging_ref = item.staging_ref.unwrap();
    assert!(h.staging.contains(&staging_ref).await);
}

#[tokio::test]
async fn test_staged_delete_failure_does_not_fail_publish() {
    let h = TestHarness::new();
    let item_id = h.seed_edited_item("sticky.mp4").await;
    h.staging.set_fail_deletes(true).await;

    let outcome = h.orchestrator.publish_tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Published(_)));

    let item = h.store.get(&item_id).unwrap().unwrap();
    assert_eq!(item.state, ItemState::Uploaded);
    assert!(item.published_url.is_some());

    // The staged copy leaks, but the publish still counts.
    let staging_ref = item.staging_ref.unwrap();
    assert!(h.staging.contains(&staging_ref).await);
}

#[tokio::test]
async fn test_staging_fetch_failure_is_terminal() {
    let h = TestHarness::new();

    // Edited item whose staged object has gone missing.
    let item = h
        .store
        .create(NewItem {
            original_name: "ghost.mp4".to_string(),
            title: "ghost".to_string(),
            description: "seeded".to_string(),
            source_path: "/tmp/ghost.mp4".to_string(),
            owner: "tester".to_string(),
        })
        .unwrap();
    h.store.update_state(&item.id, ItemState::Editing).unwrap();
    h.store.set_staging_ref(&item.id, "missing-ref").unwrap();
    h.store.update_state(&item.id, ItemState::Edited).unwrap();

    let outcome = h.orchestrator.publish_tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Failed { .. }));

    let item = h.store.get(&item.id).unwrap().unwrap();
    assert_eq!(item.state, ItemState::Failed);
    assert_eq!(h.publisher.publish_count().await, 0);
}

#[tokio::test]
async fn test_empty_submission_rejected() {
    let h = TestHarness::new();
    let result = h
        .orchestrator
        .submit(SubmitRequest {
            original_name: "empty.mp4".to_string(),
            owner: "tester".to_string(),
            data: Bytes::new(),
        })
        .await;
    assert!(result.is_err());
    assert_eq!(
        h.store
            .count(&cliprelay_core::item::ItemFilter::new())
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_stats_reflect_lifecycle() {
    let h = TestHarness::new();
    let item_id = h.submit("stat clip.mp4").await;
    h.wait_for_state(&item_id, ItemState::Edited).await;

    let stats = h.orchestrator.stats().unwrap();
    assert!(stats
        .by_state
        .iter()
        .any(|c| c.state == ItemState::Edited && c.count == 1));
    assert!(stats.uploaded_by_owner.is_empty());

    let outcome = h.orchestrator.publish_tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Published(_)));

    let stats = h.orchestrator.stats().unwrap();
    assert!(stats
        .by_state
        .iter()
        .any(|c| c.state == ItemState::Uploaded && c.count == 1));
    assert_eq!(stats.uploaded_by_owner.len(), 1);
    assert_eq!(stats.uploaded_by_owner[0].owner, "tester");
    assert_eq!(stats.uploaded_by_owner[0].count, 1);
}
