use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BrokerConfig;
use crate::handlers::HandlerRegistry;
use crate::jobs::{Broker, CompletionObserver, JobError, JobKind, JobPayload, JobSnapshot, QueuePolicy};
use crate::ledger::FjallStore;
use crate::ledger::pruning::PRUNE_INTERVAL;
use crate::observability::Metrics;
use crate::proto::JobTask;
use crate::queue::store::{FjallQueue, QueueError, now_ms};
use crate::worker::Worker;

/// A persisted task with its queue sequence number
#[derive(Clone, Debug)]
pub struct TaskEnvelope {
    pub seq: u64,
    pub task: JobTask,
}

/// Worker channels for one job kind
struct Lane {
    policy: QueuePolicy,
    senders: Vec<mpsc::Sender<TaskEnvelope>>,
    next_worker: AtomicUsize,
}

impl Lane {
    /// Round-robin without waiting. Each worker is tried once, starting at
    /// the next in turn; fails only when every channel is full or closed.
    fn dispatch(&self, envelope: TaskEnvelope) -> Result<usize, TrySendError<TaskEnvelope>> {
        let width = self.senders.len();
        let first = self.next_worker.fetch_add(1, Ordering::Relaxed);
        let mut envelope = envelope;
        let mut any_full = false;

        for offset in 0..width {
            let worker_idx = (first + offset) % width;
            match self.senders[worker_idx].try_send(envelope) {
                Ok(()) => return Ok(worker_idx),
                Err(TrySendError::Full(back)) => {
                    any_full = true;
                    envelope = back;
                }
                Err(TrySendError::Closed(back)) => envelope = back,
            }
        }

        if any_full {
            Err(TrySendError::Full(envelope))
        } else {
            Err(TrySendError::Closed(envelope))
        }
    }
}

/// Fjall-backed broker distributing jobs to per-kind worker pools
///
/// 1. `enqueue` writes a pending snapshot to the ledger
/// 2. the task is persisted to `FjallQueue` (gets a seq)
/// 3. the envelope goes to the next worker of the kind's lane via `try_send`
///
/// If step 3 fails, both records are removed again and the caller falls
/// back to direct execution. Each lane has one worker per channel, so lane
/// width is the kind's concurrency. Workers are spawned by `start()`, which
/// also re-dispatches tasks an earlier process left unacknowledged and
/// starts the hourly ledger pruner.
pub struct JobBroker {
    queue: Arc<FjallQueue>,
    ledger: FjallStore,
    lanes: BTreeMap<JobKind, Lane>,
    idle_workers: Mutex<Vec<(Worker, mpsc::Receiver<TaskEnvelope>)>>,
    /// Tasks below this seq were persisted by a previous process
    replay_below: u64,
    retention: Duration,
}

impl JobBroker {
    pub fn open(
        config: &BrokerConfig,
        registry: HandlerRegistry,
        observer: Arc<dyn CompletionObserver>,
        metrics: Arc<Metrics>,
    ) -> Result<Self, JobError> {
        let queue = Arc::new(FjallQueue::open(&config.queue_path)?);
        let ledger = FjallStore::open(&config.ledger_path)?;

        let policies = JobKind::ALL.map(|kind| {
            let overrides = match kind {
                JobKind::ContentGeneration => &config.content_generation,
                JobKind::NicheAnalysis => &config.niche_analysis,
            };
            (kind, kind.default_policy().with_overrides(overrides))
        });

        let mut lanes = BTreeMap::new();
        let mut idle_workers = Vec::new();

        for (kind, policy) in policies {
            let handler = registry.get(kind)?;
            let mut senders = Vec::with_capacity(policy.concurrency);

            for worker_id in 0..policy.concurrency {
                let (tx, rx) = mpsc::channel(config.channel_size);
                senders.push(tx);
                let worker = Worker::builder()
                    .id(worker_id)
                    .kind(kind)
                    .policy(policy)
                    .handler(handler.clone())
                    .queue(queue.clone())
                    .ledger(ledger.clone())
                    .observer(observer.clone())
                    .metrics(metrics.clone())
                    .build();
                idle_workers.push((worker, rx));
            }

            info!(
                %kind,
                workers = policy.concurrency,
                max_attempts = policy.max_attempts,
                backoff_ms = policy.backoff_base.as_millis() as u64,
                channel_size = config.channel_size,
                "Created worker lane"
            );

            lanes.insert(
                kind,
                Lane {
                    policy,
                    senders,
                    next_worker: AtomicUsize::new(0),
                },
            );
        }

        let replay_below = queue.current_seq();

        Ok(Self {
            queue,
            ledger,
            lanes,
            idle_workers: Mutex::new(idle_workers),
            replay_below,
            retention: config.retention(),
        })
    }

    pub fn policy(&self, kind: JobKind) -> Option<QueuePolicy> {
        self.lanes.get(&kind).map(|lane| lane.policy)
    }

    pub fn queue(&self) -> &Arc<FjallQueue> {
        &self.queue
    }

    fn lane(&self, kind: JobKind) -> Result<&Lane, JobError> {
        self.lanes
            .get(&kind)
            .ok_or_else(|| JobError::Configuration(format!("no worker lane for {kind}")))
    }

    fn replay_unacked(&self) {
        let pending = match self.queue.unacked() {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "Could not read unacknowledged tasks");
                return;
            }
        };

        for (seq, task) in pending.into_iter().filter(|(seq, _)| *seq < self.replay_below) {
            let Ok(kind) = task.kind.parse::<JobKind>() else {
                warn!(seq, kind = %task.kind, "Dropping task of unknown kind");
                continue;
            };
            let Ok(lane) = self.lane(kind) else { continue };

            let job_id = task.job_id.clone();
            match lane.dispatch(TaskEnvelope { seq, task }) {
                Ok(worker_idx) => info!(seq, %job_id, %kind, worker_idx, "Replaying unfinished task"),
                Err(_) => warn!(seq, %job_id, %kind, "Lane full, task left for next start"),
            }
        }
    }
}

#[async_trait]
impl Broker for JobBroker {
    async fn enqueue(&self, payload: &JobPayload) -> Result<String, JobError> {
        let kind = payload.kind();
        let lane = self.lane(kind)?;
        let job_id = Uuid::now_v7().to_string();

        self.ledger
            .upsert(&JobSnapshot::pending(&job_id, kind, lane.policy.max_attempts))?;

        let task = JobTask {
            job_id: job_id.clone(),
            kind: kind.as_str().to_string(),
            payload: serde_json::to_vec(payload).map_err(QueueError::from)?,
            max_attempts: lane.policy.max_attempts,
            backoff_ms: lane.policy.backoff_base.as_millis() as u64,
            enqueued_at_ms: now_ms(),
        };

        let seq = match self.queue.enqueue(&task) {
            Ok(seq) => seq,
            Err(e) => {
                if let Err(cleanup) = self.ledger.remove(&job_id) {
                    warn!(%job_id, error = %cleanup, "Could not remove pending snapshot");
                }
                return Err(e.into());
            }
        };
        debug!(seq, %job_id, %kind, "Task persisted to queue");

        match lane.dispatch(TaskEnvelope { seq, task }) {
            Ok(worker_idx) => {
                debug!(seq, %job_id, worker_idx, "Task sent to worker");
                Ok(job_id)
            }
            Err(e) => {
                let reason = match e {
                    TrySendError::Full(_) => "worker channel full",
                    TrySendError::Closed(_) => "worker channel closed",
                };
                warn!(seq, %job_id, %kind, reason, "Task not delivered, rolling back");
                if let Err(cleanup) = self.queue.ack(seq) {
                    warn!(seq, %job_id, error = %cleanup, "Could not ack undelivered task, it will replay on next start");
                }
                if let Err(cleanup) = self.ledger.remove(&job_id) {
                    warn!(%job_id, error = %cleanup, "Could not remove pending snapshot");
                }
                Err(QueueError::Unavailable {
                    kind: kind.to_string(),
                    reason: reason.to_string(),
                }
                .into())
            }
        }
    }

    async fn snapshot(&self, job_id: &str) -> Result<Option<JobSnapshot>, JobError> {
        Ok(self.ledger.get(job_id)?)
    }

    /// Queue readable and no worker channel closed
    fn health_check(&self) -> bool {
        if let Err(e) = self.queue.health_check() {
            warn!(error = %e, "Queue health check failed");
            return false;
        }
        self.lanes
            .values()
            .flat_map(|lane| lane.senders.iter())
            .all(|tx| !tx.is_closed())
    }

    fn start(&self) -> Vec<JoinHandle<()>> {
        let workers = match self.idle_workers.lock() {
            Ok(mut idle) => std::mem::take(&mut *idle),
            Err(_) => return Vec::new(),
        };
        if workers.is_empty() {
            return Vec::new();
        }

        info!(workers = workers.len(), "Starting broker workers");
        let mut handles: Vec<JoinHandle<()>> = workers
            .into_iter()
            .map(|(worker, rx)| tokio::spawn(worker.run(rx)))
            .collect();
        handles.push(tokio::spawn(prune_ledger(
            self.ledger.clone(),
            self.retention,
        )));

        self.replay_unacked();
        handles
    }
}

async fn prune_ledger(ledger: FjallStore, retention: Duration) {
    let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
    loop {
        ticker.tick().await;
        match ledger.prune(retention) {
            Ok(0) => {}
            Ok(pruned) => info!(pruned, "Pruned finished job snapshots"),
            Err(e) => warn!(error = %e, "Ledger pruning failed"),
        }
    }
}
