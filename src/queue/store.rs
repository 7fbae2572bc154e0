use crate::proto::{DeadLetterTask, JobTask};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use prost::Message;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Protobuf decode error: {0}")]
    ProtobufDecode(#[from] prost::DecodeError),

    #[error("Payload encoding error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Task not found: seq={0}")]
    TaskNotFound(u64),

    #[error("No worker available for {kind}: {reason}")]
    Unavailable { kind: String, reason: String },
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// Durable task log and dead letter queue backed by Fjall
///
/// Layout:
/// - `tasks` partition: u64 (big-endian) → JobTask (protobuf)
/// - `metadata` partition: "next_seq" → u64
/// - `dlq` partition: u64 (big-endian) → DeadLetterTask (protobuf)
///
/// A task stays in `tasks` until it is acknowledged or dead-lettered, so
/// anything left there after a restart was never finished.
pub struct FjallQueue {
    keyspace: Keyspace,
    tasks: PartitionHandle,
    metadata: PartitionHandle,
    dlq: PartitionHandle,
    seq_counter: Arc<AtomicU64>,
}

impl FjallQueue {
    /// Open or create a queue at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening FjallQueue at: {}", path.as_ref().display());

        let keyspace = Config::new(path).open()?;

        let tasks = keyspace.open_partition("tasks", PartitionCreateOptions::default())?;
        let metadata = keyspace.open_partition("metadata", PartitionCreateOptions::default())?;
        let dlq = keyspace.open_partition("dlq", PartitionCreateOptions::default())?;

        let current_seq = metadata
            .get(b"next_seq")?
            .map(|bytes| decode_seq(&bytes))
            .unwrap_or(0);

        info!("FjallQueue opened, current sequence: {}", current_seq);

        Ok(Self {
            keyspace,
            tasks,
            metadata,
            dlq,
            seq_counter: Arc::new(AtomicU64::new(current_seq)),
        })
    }

    /// Persist a task and return its sequence number
    pub fn enqueue(&self, task: &JobTask) -> Result<u64> {
        let seq = self.seq_counter.fetch_add(1, Ordering::SeqCst);

        self.tasks.insert(seq.to_be_bytes(), task.encode_to_vec())?;
        // Counter persisted after the task so a crash never reuses a seq
        self.metadata.insert(b"next_seq", (seq + 1).to_be_bytes())?;

        debug!(seq, job_id = %task.job_id, kind = %task.kind, "Task enqueued");

        Ok(seq)
    }

    pub fn get_task(&self, seq: u64) -> Result<Option<JobTask>> {
        match self.tasks.get(seq.to_be_bytes())? {
            Some(bytes) => Ok(Some(JobTask::decode(&*bytes)?)),
            None => Ok(None),
        }
    }

    /// Remove a finished task
    pub fn ack(&self, seq: u64) -> Result<()> {
        self.tasks.remove(seq.to_be_bytes())?;
        debug!(seq, "Task acknowledged");
        Ok(())
    }

    /// Tasks persisted but never acknowledged, in sequence order
    pub fn unacked(&self) -> Result<Vec<(u64, JobTask)>> {
        let mut pending = Vec::new();
        for item in self.tasks.iter() {
            let (key, value) = item?;
            pending.push((decode_seq(&key), JobTask::decode(&*value)?));
        }
        Ok(pending)
    }

    /// Move a task to the dead letter queue and drop it from `tasks`
    pub fn move_to_dlq(
        &self,
        seq: u64,
        failure_code: String,
        failure_message: String,
        attempts: u32,
    ) -> Result<()> {
        let task = self.get_task(seq)?.ok_or(QueueError::TaskNotFound(seq))?;

        let entry = DeadLetterTask {
            task: Some(task),
            failure_code,
            failure_message,
            attempts,
            failed_at_ms: now_ms(),
        };

        let key = seq.to_be_bytes();
        self.dlq.insert(key, entry.encode_to_vec())?;
        self.tasks.remove(key)?;

        info!(seq, attempts, "Task moved to DLQ");
        Ok(())
    }

    pub fn get_dlq_task(&self, seq: u64) -> Result<Option<DeadLetterTask>> {
        match self.dlq.get(seq.to_be_bytes())? {
            Some(bytes) => Ok(Some(DeadLetterTask::decode(&*bytes)?)),
            None => Ok(None),
        }
    }

    /// List DLQ tasks (for inspection)
    pub fn list_dlq(&self, limit: usize) -> Result<Vec<(u64, DeadLetterTask)>> {
        let mut results = Vec::new();

        for item in self.dlq.iter().take(limit) {
            let (key, value) = item?;
            results.push((decode_seq(&key), DeadLetterTask::decode(&*value)?));
        }

        Ok(results)
    }

    pub fn current_seq(&self) -> u64 {
        self.seq_counter.load(Ordering::SeqCst)
    }

    /// Flush all writes to disk
    pub fn flush(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    pub fn health_check(&self) -> Result<()> {
        let _ = self.metadata.get(b"next_seq")?;
        Ok(())
    }
}

fn decode_seq(bytes: &[u8]) -> u64 {
    u64::from_be_bytes(bytes.try_into().unwrap_or([0u8; 8]))
}

/// Current Unix timestamp in milliseconds
pub(crate) fn now_ms() -> u64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}
