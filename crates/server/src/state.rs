use std::sync::Arc;

use cliprelay_core::{
    item::ItemStore, pipeline::PublishScheduler, Config, PipelineOrchestrator, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn ItemStore>,
    orchestrator: Arc<PipelineOrchestrator>,
    scheduler: Option<Arc<PublishScheduler>>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ItemStore>,
        orchestrator: Arc<PipelineOrchestrator>,
        scheduler: Option<Arc<PublishScheduler>>,
    ) -> Self {
        Self {
            config,
            store,
            orchestrator,
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn ItemStore {
        self.store.as_ref()
    }

    pub fn orchestrator(&self) -> &PipelineOrchestrator {
        &self.orchestrator
    }

    pub fn scheduler(&self) -> Option<&PublishScheduler> {
        self.scheduler.as_deref()
    }
}
