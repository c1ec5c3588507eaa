//! Mock publishing service for testing.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::publisher::{PublishError, PublishMetadata, PublishingService};
use crate::staging::ByteStream;

/// A recorded publish call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPublish {
    pub metadata: PublishMetadata,
    /// Total bytes drained from the stream.
    pub bytes_received: usize,
    /// Whether the publish succeeded.
    pub success: bool,
}

/// Mock implementation of the PublishingService trait.
///
/// Drains the supplied stream and returns a deterministic URL per
/// call.
pub struct MockPublisher {
    publishes: Arc<RwLock<Vec<RecordedPublish>>>,
    next_error: Arc<RwLock<Option<PublishError>>>,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPublisher {
    /// Create a new mock publisher.
    pub fn new() -> Self {
        Self {
            publishes: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded publishes.
    pub async fn recorded_publishes(&self) -> Vec<RecordedPublish> {
        self.publishes.read().await.clone()
    }

    /// Get the number of publish calls made.
    pub async fn publish_count(&self) -> usize {
        self.publishes.read().await.len()
    }

    /// Configure the next publish to fail with the given error.
    pub async fn set_next_error(&self, error: PublishError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<PublishError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl PublishingService for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn insert(
        &self,
        metadata: PublishMetadata,
        mut stream: ByteStream,
    ) -> Result<String, PublishError> {
        if let Some(err) = self.take_error().await {
            self.publishes.write().await.push(RecordedPublish {
                metadata,
                bytes_received: 0,
                success: false,
            });
            return Err(err);
        }

        let mut bytes_received = 0;
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| PublishError::ApiError(format!("Stream error: {}", e)))?;
            bytes_received += chunk.len();
        }

        let mut publishes = self.publishes.write().await;
        let n = publishes.len() + 1;
        publishes.push(RecordedPublish {
            metadata,
            bytes_received,
            success: true,
        });

        Ok(format!("https://videos.example/watch/{}", n))
    }
}
