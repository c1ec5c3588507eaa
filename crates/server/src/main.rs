mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cliprelay_core::{
    item::ItemStore, load_config, pipeline::PublishScheduler, validate_config, Editor,
    FfmpegEditor, HttpPublishClient, HttpStagingClient, PipelineOrchestrator, SqliteItemStore,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CLIPRELAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Staging endpoint: {}", config.staging.url);
    info!("Publisher endpoint: {}", config.publisher.url);

    // Log a hash of the effective config so deploys can be compared
    // without leaking secrets.
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        "Starting cliprelay v{} (config {})",
        VERSION,
        &config_hash[..16]
    );

    // Create SQLite item store
    let store: Arc<SqliteItemStore> = Arc::new(
        SqliteItemStore::new(&config.database.path).context("Failed to create item store")?,
    );
    info!("Item store initialized");

    // Create FFmpeg editor and verify the binaries and overlay assets
    // are present. A failed validation is logged but not fatal: the
    // server can still accept submissions and surface the failures
    // per item.
    let editor = Arc::new(FfmpegEditor::new(config.editor.clone()));
    if let Err(e) = editor.validate().await {
        warn!("Editor validation failed: {}", e);
    }

    // Remote services
    let staging = Arc::new(HttpStagingClient::new(config.staging.clone()));
    let publisher = Arc::new(HttpPublishClient::new(config.publisher.clone()));

    // Create the pipeline orchestrator (spawns the edit queue worker)
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        config.pipeline.clone(),
        Arc::clone(&store) as Arc<dyn ItemStore>,
        editor,
        staging,
        publisher,
    ));
    info!("Pipeline orchestrator started");

    // Create the publish scheduler if enabled
    let scheduler = if config.schedule.enabled {
        let scheduler = Arc::new(
            PublishScheduler::new(&config.schedule.expression, Arc::clone(&orchestrator))
                .context("Failed to create publish scheduler")?,
        );
        scheduler.start();
        info!(
            "Publish scheduler started (schedule: {})",
            config.schedule.expression
        );
        Some(scheduler)
    } else {
        info!("Publish scheduler disabled in config");
        None
    };

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&store) as Arc<dyn ItemStore>,
        orchestrator,
        scheduler.clone(),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop scheduler if running
    if let Some(ref scheduler) = scheduler {
        info!("Stopping publish scheduler...");
        scheduler.stop();
    }

    info!("Server shutting down...");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
