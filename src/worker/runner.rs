//! Task runner - executes queued jobs with retry and dead-lettering

use bon::Builder;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::handlers::JobHandler;
use crate::jobs::{CompletionObserver, JobError, JobKind, JobPayload, JobSnapshot, JobStatus, QueuePolicy};
use crate::ledger::FjallStore;
use crate::observability::Metrics;
use crate::queue::{FjallQueue, TaskEnvelope};

/// One queue consumer; a lane runs `concurrency` of these
#[derive(Builder)]
pub struct Worker {
    id: usize,
    kind: JobKind,
    policy: QueuePolicy,
    handler: Arc<dyn JobHandler>,
    queue: Arc<FjallQueue>,
    ledger: FjallStore,
    observer: Arc<dyn CompletionObserver>,
    metrics: Arc<Metrics>,
}

impl Worker {
    /// Consume envelopes until every sender is dropped
    pub async fn run(self, mut rx: mpsc::Receiver<TaskEnvelope>) {
        debug!(worker_id = self.id, kind = %self.kind, "Worker started");
        while let Some(envelope) = rx.recv().await {
            self.process(envelope).await;
        }
        info!(worker_id = self.id, kind = %self.kind, "Worker stopped");
    }

    /// Run one task to a terminal status
    pub async fn process(&self, envelope: TaskEnvelope) -> JobStatus {
        let TaskEnvelope { seq, task } = envelope;
        let job_id = task.job_id.as_str();

        let payload = match serde_json::from_slice::<JobPayload>(&task.payload) {
            Ok(payload) if payload.kind() == self.kind => payload,
            Ok(payload) => {
                let err = JobError::InvalidPayload(format!(
                    "{} payload on {} queue",
                    payload.kind(),
                    self.kind
                ));
                return self.fail(seq, job_id, 0, &err);
            }
            Err(e) => {
                let err = JobError::InvalidPayload(e.to_string());
                return self.fail(seq, job_id, 0, &err);
            }
        };

        // Policy recorded at enqueue time wins over the current one
        let max_attempts = if task.max_attempts > 0 {
            task.max_attempts
        } else {
            self.policy.max_attempts
        };
        let policy = QueuePolicy {
            max_attempts,
            backoff_base: std::time::Duration::from_millis(task.backoff_ms),
            ..self.policy
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.record(job_id, |s| {
                s.status = JobStatus::Active;
                s.attempts = attempt;
                s.max_attempts = max_attempts;
            });
            debug!(worker_id = self.id, seq, job_id, attempt, "Executing job");

            match self.handler.execute(&payload).await {
                Ok(output) => {
                    self.record(job_id, |s| {
                        s.status = JobStatus::Completed;
                        s.result = Some(output.clone());
                        s.error = None;
                    });
                    if let Err(e) = self.queue.ack(seq) {
                        error!(seq, job_id, error = %e, "Failed to acknowledge task");
                    }
                    self.metrics.job_completed();
                    self.observer.on_completed(job_id, self.kind, &output).await;

                    if attempt > 1 {
                        info!(job_id, kind = %self.kind, attempt, "Job succeeded after retry");
                    } else {
                        info!(job_id, kind = %self.kind, "Job completed");
                    }
                    return JobStatus::Completed;
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let backoff = policy.backoff(attempt);
                    warn!(
                        job_id,
                        kind = %self.kind,
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Job failed, retrying"
                    );
                    self.record(job_id, |s| {
                        s.status = JobStatus::Pending;
                        s.error = Some(e.to_string());
                    });
                    self.metrics.job_retried();
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return self.fail(seq, job_id, attempt, &e),
            }
        }
    }

    fn fail(&self, seq: u64, job_id: &str, attempts: u32, err: &JobError) -> JobStatus {
        warn!(job_id, kind = %self.kind, attempts, error = %err, "Job failed permanently");

        self.record(job_id, |s| {
            s.status = JobStatus::Failed;
            s.attempts = attempts;
            s.error = Some(err.to_string());
        });
        if let Err(e) = self
            .queue
            .move_to_dlq(seq, err.code().to_string(), err.to_string(), attempts)
        {
            error!(seq, job_id, error = %e, "Failed to move task to DLQ");
        }
        self.metrics.job_failed();

        JobStatus::Failed
    }

    /// Apply a ledger transition; ledger failures are logged, never fatal
    fn record(&self, job_id: &str, apply: impl FnOnce(&mut JobSnapshot)) {
        match self.ledger.update(job_id, apply) {
            Ok(Some(_)) => {}
            Ok(None) => warn!(job_id, "No ledger snapshot for job"),
            Err(e) => error!(job_id, error = %e, "Failed to update ledger"),
        }
    }
}
