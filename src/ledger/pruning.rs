//! Retention for finished job snapshots

use chrono::{DateTime, Utc};
use fjall::PartitionHandle;
use std::time::Duration;
use tracing::debug;

use super::error::Result;
use super::partitions::decode_job_key;
use crate::jobs::JobSnapshot;

/// Interval between pruning passes of the broker's ledger
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Remove completed and failed snapshots last updated before `cutoff`.
///
/// Pending and active snapshots are kept whatever their age.
pub fn prune_terminal(jobs: &PartitionHandle, cutoff: DateTime<Utc>) -> Result<usize> {
    let mut expired = Vec::new();

    for item in jobs.iter() {
        let (key, value) = item?;
        if decode_job_key(&key).is_none() {
            continue;
        }
        let snapshot: JobSnapshot = serde_json::from_slice(&value)?;
        if snapshot.status.is_terminal() && snapshot.updated_at < cutoff {
            expired.push(key);
        }
    }

    let pruned = expired.len();
    for key in expired {
        jobs.remove(key)?;
    }

    debug!(pruned, %cutoff, "Pruned job snapshots");
    Ok(pruned)
}
