use std::sync::Arc;
use vidfetch_core::{Config, JobOrchestrator, RetentionManager};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<JobOrchestrator>,
    retention: Arc<RetentionManager>,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<JobOrchestrator>,
        retention: Arc<RetentionManager>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            retention,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<JobOrchestrator> {
        &self.orchestrator
    }

    pub fn retention(&self) -> &Arc<RetentionManager> {
        &self.retention
    }
}
