//! HTTP publishing client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Body, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::PublishError;
use super::traits::PublishingService;
use super::types::PublishMetadata;
use crate::staging::ByteStream;

/// Configuration for the HTTP publishing client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Base URL of the publishing service.
    #[serde(default = "default_url")]
    pub url: String,

    /// Bearer token for authentication.
    #[serde(default)]
    pub api_token: String,

    /// Request timeout in seconds. Applies to the connection phase
    /// only; the upload itself is unbounded.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_token: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

/// HTTP publishing client. Uploads go to `/videos` as a two-part
/// multipart request: a JSON metadata part and the media stream.
pub struct HttpPublishClient {
    client: Client,
    config: PublisherConfig,
}

impl HttpPublishClient {
    /// Create a new publishing client.
    pub fn new(config: PublisherConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    url: Option<String>,
    id: Option<String>,
}

#[async_trait]
impl PublishingService for HttpPublishClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn insert(
        &self,
        metadata: PublishMetadata,
        stream: ByteStream,
    ) -> Result<String, PublishError> {
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| PublishError::ApiError(format!("Failed to encode metadata: {}", e)))?;

        let metadata_part = multipart::Part::text(metadata_json)
            .mime_str("application/json")
            .map_err(|e| PublishError::ApiError(e.to_string()))?;

        let media_part = multipart::Part::stream(Body::wrap_stream(stream))
            .file_name("clip.mp4")
            .mime_str("video/mp4")
            .map_err(|e| PublishError::ApiError(e.to_string()))?;

        let form = multipart::Form::new()
            .part("metadata", metadata_part)
            .part("media", media_part);

        debug!(title = %metadata.title, "Publishing clip");

        let mut request = self
            .client
            .post(format!("{}/videos", self.base_url()))
            .multipart(form);
        if !self.config.api_token.is_empty() {
            request = request.bearer_auth(&self.config.api_token);
        }

        let response = request.send().await.map_err(PublishError::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PublishError::AuthenticationFailed(format!(
                "HTTP {}",
                status
            )));
        }
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        if !status.is_success() {
            return Err(PublishError::ApiError(format!("HTTP {}", status)));
        }

        let parsed: InsertResponse = response
            .json()
            .await
            .map_err(|e| PublishError::ApiError(format!("Failed to parse response: {}", e)))?;

        match (parsed.url, parsed.id) {
            (Some(url), _) => Ok(url),
            (None, Some(id)) => Ok(format!("{}/videos/{}", self.base_url(), id)),
            (None, None) => Err(PublishError::MissingLocator(
                "response carried neither url nor id".to_string(),
            )),
        }
    }
}
