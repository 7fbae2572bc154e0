//! Direct and queued execution behind one interface

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::JobError;
use super::models::{
    DIRECT_ID_PREFIX, ExecutionMode, JobKind, JobOutput, JobPayload, JobSnapshot, JobStatus,
    StatusReport, Submission,
};
use crate::handlers::HandlerRegistry;
use crate::observability::Metrics;

/// Notified exactly once for every successful run, queued or direct.
///
/// Usage accounting belongs here; the job system itself keeps no counts
/// beyond [`Metrics`].
#[async_trait]
pub trait CompletionObserver: Send + Sync {
    async fn on_completed(&self, job_id: &str, kind: JobKind, output: &JobOutput);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

#[async_trait]
impl CompletionObserver for NoopObserver {
    async fn on_completed(&self, _job_id: &str, _kind: JobKind, _output: &JobOutput) {}
}

/// Durable queue with per-kind retry policy and workers
#[async_trait]
pub trait Broker: Send + Sync {
    /// Persist and dispatch a job, returning its opaque id
    async fn enqueue(&self, payload: &JobPayload) -> Result<String, JobError>;

    async fn snapshot(&self, job_id: &str) -> Result<Option<JobSnapshot>, JobError>;

    fn health_check(&self) -> bool {
        true
    }

    /// Spawn the workers; calling it again spawns nothing
    fn start(&self) -> Vec<JoinHandle<()>>;
}

#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn mode(&self) -> ExecutionMode;

    async fn submit(&self, payload: JobPayload) -> Result<Submission, JobError>;

    async fn status(&self, kind: JobKind, job_id: &str) -> StatusReport;

    fn start(&self) -> Vec<JoinHandle<()>>;

    fn healthy(&self) -> bool;
}

const DIRECT_NOTE: &str = "Job ran directly without a queue; its result was returned on submission";

/// Runs the pipeline in the caller's task. No retries.
#[derive(Clone)]
pub struct DirectExecution {
    registry: HandlerRegistry,
    observer: Arc<dyn CompletionObserver>,
    metrics: Arc<Metrics>,
}

impl DirectExecution {
    pub fn new(
        registry: HandlerRegistry,
        observer: Arc<dyn CompletionObserver>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            observer,
            metrics,
        }
    }

    pub fn is_local_id(job_id: &str) -> bool {
        job_id.starts_with(DIRECT_ID_PREFIX)
    }

    async fn run(&self, payload: JobPayload) -> Result<Submission, JobError> {
        let kind = payload.kind();
        let handler = self.registry.get(kind)?;
        let job_id = format!("{DIRECT_ID_PREFIX}{}", Uuid::new_v4());
        self.metrics.job_direct();

        let output = match handler.execute(&payload).await {
            Ok(output) => output,
            Err(e) => {
                self.metrics.job_failed();
                warn!(%job_id, %kind, error = %e, "Direct job failed");
                return Err(e);
            }
        };

        self.metrics.job_completed();
        self.observer.on_completed(&job_id, kind, &output).await;
        info!(%job_id, %kind, "Direct job completed");

        Ok(Submission {
            job_id,
            mode: ExecutionMode::Direct,
            result: Some(output),
        })
    }

    fn local_status(&self, kind: JobKind, job_id: &str) -> StatusReport {
        StatusReport {
            job_id: job_id.to_string(),
            kind,
            status: JobStatus::Completed,
            attempts: 1,
            result: None,
            error: None,
            note: Some(DIRECT_NOTE.to_string()),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for DirectExecution {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Direct
    }

    async fn submit(&self, payload: JobPayload) -> Result<Submission, JobError> {
        self.run(payload).await
    }

    async fn status(&self, kind: JobKind, job_id: &str) -> StatusReport {
        if Self::is_local_id(job_id) {
            return self.local_status(kind, job_id);
        }
        StatusReport::unknown(
            kind,
            job_id,
            "No broker configured; this id was not issued by this process",
        )
    }

    fn start(&self) -> Vec<JoinHandle<()>> {
        Vec::new()
    }

    fn healthy(&self) -> bool {
        true
    }
}

/// Enqueues through the broker, running directly when enqueueing fails
pub struct QueuedExecution {
    broker: Arc<dyn Broker>,
    fallback: DirectExecution,
    metrics: Arc<Metrics>,
}

impl QueuedExecution {
    pub fn new(broker: Arc<dyn Broker>, fallback: DirectExecution, metrics: Arc<Metrics>) -> Self {
        Self {
            broker,
            fallback,
            metrics,
        }
    }
}

#[async_trait]
impl ExecutionStrategy for QueuedExecution {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Queued
    }

    async fn submit(&self, payload: JobPayload) -> Result<Submission, JobError> {
        match self.broker.enqueue(&payload).await {
            Ok(job_id) => {
                self.metrics.job_queued();
                info!(%job_id, kind = %payload.kind(), "Job queued");
                Ok(Submission {
                    job_id,
                    mode: ExecutionMode::Queued,
                    result: None,
                })
            }
            Err(e) => {
                warn!(kind = %payload.kind(), error = %e, "Enqueue failed, running job directly");
                self.fallback.run(payload).await
            }
        }
    }

    async fn status(&self, kind: JobKind, job_id: &str) -> StatusReport {
        if DirectExecution::is_local_id(job_id) {
            return self.fallback.local_status(kind, job_id);
        }

        match self.broker.snapshot(job_id).await {
            Ok(Some(snapshot)) if snapshot.kind == kind => snapshot.report(),
            Ok(Some(snapshot)) => StatusReport::unknown(
                kind,
                job_id,
                format!("Job {job_id} is a {} job", snapshot.kind),
            ),
            Ok(None) => StatusReport::unknown(kind, job_id, "Job not found in broker ledger"),
            Err(e) => {
                warn!(%job_id, %kind, error = %e, "Broker status lookup failed");
                StatusReport::unknown(kind, job_id, format!("Broker unavailable: {e}"))
            }
        }
    }

    fn start(&self) -> Vec<JoinHandle<()>> {
        self.broker.start()
    }

    fn healthy(&self) -> bool {
        self.broker.health_check()
    }
}
