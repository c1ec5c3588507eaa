//! HTTP staging client implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Body, Client, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::error::StagingError;
use super::traits::{ByteStream, StagingService};

/// Configuration for the HTTP staging client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Base URL of the staging service.
    #[serde(default = "default_url")]
    pub url: String,

    /// Bearer token for authentication.
    #[serde(default)]
    pub api_token: String,

    /// Request timeout in seconds. Applies to the connection phase
    /// only; uploads and downloads of large clips may take longer.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

fn default_url() -> String {
    "http://localhost:9100".to_string()
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_token: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

/// HTTP staging client. Objects are stored and retrieved by name
/// under `/objects/`.
pub struct HttpStagingClient {
    client: Client,
    config: StagingConfig,
}

impl HttpStagingClient {
    /// Create a new staging client.
    pub fn new(config: StagingConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/objects/{}", self.base_url(), urlencoding::encode(name))
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.api_token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.config.api_token)
        }
    }

    fn check_status(status: StatusCode, staging_ref: &str) -> Result<(), StagingError> {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StagingError::AuthenticationFailed(format!(
                "HTTP {}",
                status
            )));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StagingError::NotFound(staging_ref.to_string()));
        }
        if !status.is_success() {
            return Err(StagingError::ApiError(format!("HTTP {}", status)));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    #[serde(rename = "ref")]
    staging_ref: String,
}

#[async_trait]
impl StagingService for HttpStagingClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn put(&self, local_path: &Path, name: &str) -> Result<String, StagingError> {
        let file = tokio::fs::File::open(local_path).await?;
        let size = file.metadata().await?.len();

        debug!(name, size, "Uploading to staging");

        let response = self
            .with_auth(self.client.put(self.object_url(name)))
            .header("content-length", size)
            .body(Body::from(file))
            .send()
            .await
            .map_err(StagingError::from_reqwest)?;

        Self::check_status(response.status(), name)?;

        // Servers that return a body with an explicit ref win over the
        // name-derived default.
        if let Ok(parsed) = response.json::<PutResponse>().await {
            Ok(parsed.staging_ref)
        } else {
            Ok(name.to_string())
        }
    }

    async fn get_stream(&self, staging_ref: &str) -> Result<ByteStream, StagingError> {
        let response = self
            .with_auth(self.client.get(self.object_url(staging_ref)))
            .send()
            .await
            .map_err(StagingError::from_reqwest)?;

        Self::check_status(response.status(), staging_ref)?;

        Ok(response
            .bytes_stream()
            .map_err(StagingError::from_reqwest)
            .boxed())
    }

    async fn delete(&self, staging_ref: &str) -> Result<(), StagingError> {
        let response = self
            .with_auth(self.client.delete(self.object_url(staging_ref)))
            .send()
            .await
            .map_err(StagingError::from_reqwest)?;

        // Deleting an absent object is a no-op.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Self::check_status(response.status(), staging_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_encodes_name() {
        let client = HttpStagingClient::new(StagingConfig {
            url: "http://stage.local/".to_string(),
            ..Default::default()
        });
        assert_eq!(
            client.object_url("my clip.mp4"),
            "http://stage.local/objects/my%20clip.mp4"
        );
    }

    #[test]
    fn test_check_status() {
        assert!(HttpStagingClient::check_status(StatusCode::OK, "x").is_ok());
        assert!(matches!(
            HttpStagingClient::check_status(StatusCode::NOT_FOUND, "x"),
            Err(StagingError::NotFound(_))
        ));
        assert!(matches!(
            HttpStagingClient::check_status(StatusCode::UNAUTHORIZED, "x"),
            Err(StagingError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            HttpStagingClient::check_status(StatusCode::INTERNAL_SERVER_ERROR, "x"),
            Err(StagingError::ApiError(_))
        ));
    }
}
