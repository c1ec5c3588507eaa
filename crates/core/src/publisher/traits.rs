//! Trait definitions for the publisher module.

use async_trait::async_trait;

use super::error::PublishError;
use super::types::PublishMetadata;
use crate::staging::ByteStream;

/// The platform a finished clip is published to.
#[async_trait]
pub trait PublishingService: Send + Sync {
    /// Returns the name of this publishing implementation.
    fn name(&self) -> &str;

    /// Uploads a clip from a byte stream with its metadata and
    /// returns the permanent public URL.
    async fn insert(
        &self,
        metadata: PublishMetadata,
        stream: ByteStream,
    ) -> Result<String, PublishError>;
}
