pub mod config;
pub mod editor;
pub mod item;
pub mod metrics;
pub mod pipeline;
pub mod publisher;
pub mod staging;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use editor::{Editor, EditorConfig, EditorError, FfmpegEditor};
pub use item::{ItemState, ItemStore, SqliteItemStore, WorkItem};
pub use pipeline::{
    PipelineConfig, PipelineError, PipelineOrchestrator, PublishScheduler, SubmitRequest,
    TickOutcome,
};
pub use publisher::{HttpPublishClient, PublishError, PublishingService};
pub use staging::{HttpStagingClient, StagingError, StagingService};
