use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::editor::EditorConfig;
use crate::pipeline::PipelineConfig;
use crate::publisher::PublisherConfig;
use crate::staging::StagingConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cliprelay.db")
}

/// Publish schedule configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Cron expression for publish trigger firings. Classic 5-field
    /// crontab form or the 6/7-field form with seconds.
    #[serde(default = "default_expression")]
    pub expression: String,

    /// Whether the scheduler runs at all. Disabled is useful when an
    /// operator drives publishing manually.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            expression: default_expression(),
            enabled: default_enabled(),
        }
    }
}

fn default_expression() -> String {
    // Every three hours on the hour.
    "0 */3 * * *".to_string()
}

fn default_enabled() -> bool {
    true
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub editor: EditorConfig,
    pub staging: SanitizedRemoteConfig,
    pub publisher: SanitizedRemoteConfig,
    pub pipeline: PipelineConfig,
    pub schedule: ScheduleConfig,
}

/// Sanitized remote service config (API token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRemoteConfig {
    pub url: String,
    pub api_token_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            editor: config.editor.clone(),
            staging: SanitizedRemoteConfig {
                url: config.staging.url.clone(),
                api_token_configured: !config.staging.api_token.is_empty(),
                timeout_secs: config.staging.timeout_secs,
            },
            publisher: SanitizedRemoteConfig {
                url: config.publisher.url.clone(),
                api_token_configured: !config.publisher.api_token.is_empty(),
                timeout_secs: config.publisher.timeout_secs,
            },
            pipeline: config.pipeline.clone(),
            schedule: config.schedule.clone(),
        }
    }
}
