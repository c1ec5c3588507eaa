//! Mock staging service for testing.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::staging::{ByteStream, StagingError, StagingService};

/// A recorded staging call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingCall {
    Put { name: String },
    GetStream { staging_ref: String },
    Delete { staging_ref: String },
}

/// Mock implementation of the StagingService trait.
///
/// Objects are held in memory; put reads the local file so assertions
/// can check the staged content.
pub struct MockStaging {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    calls: Arc<RwLock<Vec<StagingCall>>>,
    next_error: Arc<RwLock<Option<StagingError>>>,
    fail_deletes: Arc<RwLock<bool>>,
}

impl Default for MockStaging {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStaging {
    /// Create a new mock staging service.
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            fail_deletes: Arc::new(RwLock::new(false)),
        }
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<StagingCall> {
        self.calls.read().await.clone()
    }

    /// Whether an object with this ref is currently staged.
    pub async fn contains(&self, staging_ref: &str) -> bool {
        self.objects.read().await.contains_key(staging_ref)
    }

    /// Number of currently staged objects.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Pre-stage an object directly, bypassing `put`.
    pub async fn insert_object(&self, staging_ref: &str, data: Vec<u8>) {
        self.objects
            .write()
            .await
            .insert(staging_ref.to_string(), data);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: StagingError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every `delete` call fail, leaving puts and gets untouched.
    pub async fn set_fail_deletes(&self, fail: bool) {
        *self.fail_deletes.write().await = fail;
    }

    async fn take_error(&self) -> Option<StagingError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl StagingService for MockStaging {
    fn name(&self) -> &str {
        "mock"
    }

    async fn put(&self, local_path: &Path, name: &str) -> Result<String, StagingError> {
        self.calls.write().await.push(StagingCall::Put {
            name: name.to_string(),
        });
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let data = tokio::fs::read(local_path).await?;
        self.objects.write().await.insert(name.to_string(), data);
        Ok(name.to_string())
    }

    async fn get_stream(&self, staging_ref: &str) -> Result<ByteStream, StagingError> {
        self.calls.write().await.push(StagingCall::GetStream {
            staging_ref: staging_ref.to_string(),
        });
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let data = self
            .objects
            .read()
            .await
            .get(staging_ref)
            .cloned()
            .ok_or_else(|| StagingError::NotFound(staging_ref.to_string()))?;

        Ok(futures::stream::once(async move { Ok(Bytes::from(data)) }).boxed())
    }

    async fn delete(&self, staging_ref: &str) -> Result<(), StagingError> {
        self.calls.write().await.push(StagingCall::Delete {
            staging_ref: staging_ref.to_string(),
        });
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if *self.fail_deletes.read().await {
            return Err(StagingError::ConnectionFailed(
                "delete unavailable".to_string(),
            ));
        }

        // Deleting an absent object is a no-op.
        self.objects.write().await.remove(staging_ref);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete_roundtrip() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("clip.mp4");
        tokio::fs::write(&file, b"content").await.unwrap();

        let staging = MockStaging::new();
        let staging_ref = staging.put(&file, "clip.mp4").await.unwrap();
        assert!(staging.contains(&staging_ref).await);

        let mut stream = staging.get_stream(&staging_ref).await.unwrap();
        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"content");

        staging.delete(&staging_ref).await.unwrap();
        assert!(!staging.contains(&staging_ref).await);
    }

    #[tokio::test]
    async fn test_delete_absent_is_ok() {
        let staging = MockStaging::new();
        assert!(staging.delete("nope").await.is_ok());
    }

    #[tokio::test]
    async fn test_error_injection() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("clip.mp4");
        tokio::fs::write(&file, b"content").await.unwrap();

        let staging = MockStaging::new();
        staging
            .set_next_error(StagingError::ConnectionFailed("down".to_string()))
            .await;

        assert!(staging.put(&file, "clip.mp4").await.is_err());
        assert!(!staging.contains("clip.mp4").await);
    }
}
