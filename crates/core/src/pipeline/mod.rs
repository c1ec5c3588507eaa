//! The publishing pipeline: submission, serial editing, staged storage
//! and scheduled publication.

mod edit_queue;
mod error;
mod orchestrator;
mod scheduler;

pub use edit_queue::{EditJobHandler, EditQueue};
pub use error::PipelineError;
pub use orchestrator::{
    PipelineConfig, PipelineOrchestrator, PipelineStats, SubmitOutcome, SubmitRequest, TickOutcome,
};
pub use scheduler::{parse_schedule, PublishScheduler};
