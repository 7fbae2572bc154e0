use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::JobError;
use super::models::{ExecutionMode, JobKind, JobPayload, StatusReport, Submission};
use super::strategy::{
    Broker, CompletionObserver, DirectExecution, ExecutionStrategy, NoopObserver, QueuedExecution,
};
use crate::config::BrokerConfig;
use crate::handlers::HandlerRegistry;
use crate::observability::Metrics;
use crate::queue::JobBroker;

/// Single entry point for running jobs.
///
/// The execution strategy is chosen once, at construction: queued when a
/// broker is present, direct otherwise. Callers see the same `Submission`
/// shape either way and branch only on whether `result` is set.
#[derive(Clone)]
pub struct JobRouter {
    strategy: Arc<dyn ExecutionStrategy>,
    metrics: Arc<Metrics>,
}

#[bon::bon]
impl JobRouter {
    #[builder]
    pub fn new(
        registry: HandlerRegistry,
        broker: Option<Arc<dyn Broker>>,
        observer: Option<Arc<dyn CompletionObserver>>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        let metrics = metrics.unwrap_or_default();
        let observer = observer.unwrap_or_else(|| Arc::new(NoopObserver));
        let direct = DirectExecution::new(registry, observer, metrics.clone());

        let strategy: Arc<dyn ExecutionStrategy> = match broker {
            Some(broker) => Arc::new(QueuedExecution::new(broker, direct, metrics.clone())),
            None => Arc::new(direct),
        };
        info!(mode = ?strategy.mode(), "Job router ready");

        Self { strategy, metrics }
    }
}

impl JobRouter {
    /// Router without a broker: every job runs in the caller's task
    pub fn direct(registry: HandlerRegistry) -> Self {
        Self::builder().registry(registry).build()
    }

    /// Router for the given broker configuration, opening the Fjall broker
    /// when one is configured. A broker that fails to open leaves the router
    /// in direct mode.
    pub fn from_config(
        broker: Option<&BrokerConfig>,
        registry: HandlerRegistry,
        observer: Arc<dyn CompletionObserver>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let broker = broker.and_then(|config| {
            match JobBroker::open(config, registry.clone(), observer.clone(), metrics.clone()) {
                Ok(broker) => Some(Arc::new(broker) as Arc<dyn Broker>),
                Err(e) => {
                    warn!(
                        error = %e,
                        queue_path = %config.queue_path.display(),
                        "Broker unavailable, running jobs directly"
                    );
                    None
                }
            }
        });

        Self::builder()
            .registry(registry)
            .maybe_broker(broker)
            .observer(observer)
            .metrics(metrics)
            .build()
    }

    pub fn mode(&self) -> ExecutionMode {
        self.strategy.mode()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Submit a job. `kind` must match the payload.
    pub async fn submit(&self, kind: JobKind, payload: JobPayload) -> Result<Submission, JobError> {
        if payload.kind() != kind {
            return Err(JobError::InvalidPayload(format!(
                "{} payload submitted as {kind}",
                payload.kind()
            )));
        }
        payload.precheck()?;

        self.metrics.job_submitted();
        debug!(%kind, "Submitting job");
        self.strategy.submit(payload).await
    }

    pub async fn status(&self, kind: JobKind, job_id: &str) -> StatusReport {
        self.strategy.status(kind, job_id).await
    }

    /// False when the broker's queue or worker channels are unusable
    pub fn healthy(&self) -> bool {
        self.strategy.healthy()
    }

    /// Start queue workers. Direct mode has none.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        self.strategy.start()
    }
}
