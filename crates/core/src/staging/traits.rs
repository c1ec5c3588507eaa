//! Trait definitions for the staging module.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::path::Path;

use super::error::StagingError;

/// A stream of bytes pulled from the staging service.
pub type ByteStream = BoxStream<'static, Result<Bytes, StagingError>>;

/// Temporary remote storage for edited clips awaiting publication.
#[async_trait]
pub trait StagingService: Send + Sync {
    /// Returns the name of this staging implementation.
    fn name(&self) -> &str;

    /// Uploads a local file under `name` and returns an opaque
    /// staging reference.
    async fn put(&self, local_path: &Path, name: &str) -> Result<String, StagingError>;

    /// Opens the staged object as a byte stream.
    async fn get_stream(&self, staging_ref: &str) -> Result<ByteStream, StagingError>;

    /// Deletes a staged object. Deleting an already-absent object is
    /// not an error.
    async fn delete(&self, staging_ref: &str) -> Result<(), StagingError>;
}
