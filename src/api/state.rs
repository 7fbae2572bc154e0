use std::sync::Arc;

use crate::config::Config;
use crate::handlers::HandlerRegistry;
use crate::jobs::{JobError, JobRouter, NoopObserver};
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub router: JobRouter,
}

impl AppState {
    pub fn new(config: Config, router: JobRouter) -> Self {
        Self {
            config: Arc::new(config),
            router,
        }
    }

    /// State with handlers and execution mode derived from configuration.
    ///
    /// Queue workers are not started; call `router.start()`.
    pub fn from_config(config: Config) -> Result<Self, JobError> {
        let registry = HandlerRegistry::from_config(&config)?;
        let router = JobRouter::from_config(
            config.broker.as_ref(),
            registry,
            Arc::new(NoopObserver),
            Arc::new(Metrics::new()),
        );
        Ok(Self::new(config, router))
    }
}
