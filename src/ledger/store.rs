use std::path::Path;
use std::time::Duration;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};

use crate::jobs::{JobSnapshot, JobStatus};

use super::error::Result;
use super::partitions::{decode_job_key, encode_job_key};
use super::pruning::prune_terminal;

/// Fjall-backed persistent storage for job snapshots
#[derive(Clone)]
pub struct FjallStore {
    keyspace: Keyspace,
    jobs: PartitionHandle,
}

impl FjallStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Fjall store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let jobs = keyspace.open_partition("jobs", PartitionCreateOptions::default())?;

        info!("Fjall store opened successfully");
        Ok(Self { keyspace, jobs })
    }

    /// Store or update a job snapshot
    pub fn upsert(&self, snapshot: &JobSnapshot) -> Result<()> {
        let key = encode_job_key(&snapshot.job_id);
        let value = serde_json::to_vec(snapshot)?;
        self.jobs.insert(key, value)?;
        debug!(job_id = %snapshot.job_id, status = ?snapshot.status, "Upserted job");
        Ok(())
    }

    pub fn get(&self, job_id: &str) -> Result<Option<JobSnapshot>> {
        match self.jobs.get(encode_job_key(job_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Read-modify-write of one snapshot; missing snapshots are left alone
    pub fn update<F>(&self, job_id: &str, apply: F) -> Result<Option<JobSnapshot>>
    where
        F: FnOnce(&mut JobSnapshot),
    {
        let Some(mut snapshot) = self.get(job_id)? else {
            return Ok(None);
        };
        apply(&mut snapshot);
        snapshot.updated_at = chrono::Utc::now();
        self.upsert(&snapshot)?;
        Ok(Some(snapshot))
    }

    pub fn remove(&self, job_id: &str) -> Result<()> {
        self.jobs.remove(encode_job_key(job_id))?;
        Ok(())
    }

    /// Drop finished snapshots not updated within `retention`
    pub fn prune(&self, retention: Duration) -> Result<usize> {
        let cutoff = chrono::Duration::from_std(retention)
            .ok()
            .and_then(|retention| chrono::Utc::now().checked_sub_signed(retention));
        match cutoff {
            Some(cutoff) => prune_terminal(&self.jobs, cutoff),
            None => Ok(0),
        }
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Snapshot counts by status (for health reporting)
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stats = StoreStats::default();

        for item in self.jobs.iter() {
            let (key, value) = item?;
            if decode_job_key(&key).is_none() {
                continue;
            }
            let snapshot: JobSnapshot = serde_json::from_slice(&value)?;
            stats.job_count += 1;
            match snapshot.status {
                JobStatus::Pending | JobStatus::Active => stats.in_flight += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Unknown => {}
            }
        }

        Ok(stats)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub job_count: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobKind;
    use tempfile::TempDir;

    fn create_test_store() -> (FjallStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FjallStore::open(temp_dir.path().join("test_ledger")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_upsert_and_get_job() {
        let (store, _temp) = create_test_store();
        let snapshot = JobSnapshot::pending("job_123", JobKind::NicheAnalysis, 2);

        store.upsert(&snapshot).unwrap();
        let retrieved = store.get("job_123").unwrap().unwrap();

        assert_eq!(retrieved, snapshot);
    }

    #[test]
    fn test_get_nonexistent_job() {
        let (store, _temp) = create_test_store();
        assert!(store.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_update_applies_and_touches_timestamp() {
        let (store, _temp) = create_test_store();
        let snapshot = JobSnapshot::pending("job_1", JobKind::ContentGeneration, 3);
        store.upsert(&snapshot).unwrap();

        let updated = store
            .update("job_1", |s| {
                s.status = JobStatus::Active;
                s.attempts = 1;
            })
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, JobStatus::Active);
        assert!(updated.updated_at >= snapshot.updated_at);
        assert_eq!(store.get("job_1").unwrap().unwrap().attempts, 1);

        assert!(store.update("missing", |_| {}).unwrap().is_none());
    }

    #[test]
    fn test_remove_and_stats() {
        let (store, _temp) = create_test_store();
        store
            .upsert(&JobSnapshot::pending("a", JobKind::ContentGeneration, 3))
            .unwrap();
        let mut done = JobSnapshot::pending("b", JobKind::ContentGeneration, 3);
        done.status = JobStatus::Completed;
        store.upsert(&done).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.job_count, 2);
        assert_eq!(stats.in_flight, 1);
        assert_eq!(stats.completed, 1);

        store.remove("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
        store.persist().unwrap();
    }

    #[test]
    fn test_prune_drops_old_finished_snapshots() {
        let (store, _temp) = create_test_store();
        let two_days_ago = chrono::Utc::now() - chrono::Duration::hours(48);

        let mut old_done = JobSnapshot::pending("old-done", JobKind::ContentGeneration, 3);
        old_done.status = JobStatus::Completed;
        old_done.updated_at = two_days_ago;
        let mut old_failed = JobSnapshot::pending("old-failed", JobKind::NicheAnalysis, 2);
        old_failed.status = JobStatus::Failed;
        old_failed.updated_at = two_days_ago;
        let mut old_pending = JobSnapshot::pending("old-pending", JobKind::NicheAnalysis, 2);
        old_pending.updated_at = two_days_ago;
        let mut fresh_done = JobSnapshot::pending("fresh-done", JobKind::ContentGeneration, 3);
        fresh_done.status = JobStatus::Completed;

        for snapshot in [&old_done, &old_failed, &old_pending, &fresh_done] {
            store.upsert(snapshot).unwrap();
        }

        let pruned = store.prune(Duration::from_secs(24 * 60 * 60)).unwrap();
        assert_eq!(pruned, 2);
        assert!(store.get("old-done").unwrap().is_none());
        assert!(store.get("old-failed").unwrap().is_none());
        assert!(store.get("old-pending").unwrap().is_some());
        assert!(store.get("fresh-done").unwrap().is_some());

        assert_eq!(store.prune(Duration::from_secs(24 * 60 * 60)).unwrap(), 0);
    }

    #[test]
    fn test_prune_with_huge_retention_keeps_everything() {
        let (store, _temp) = create_test_store();
        let mut done = JobSnapshot::pending("done", JobKind::ContentGeneration, 3);
        done.status = JobStatus::Completed;
        store.upsert(&done).unwrap();

        assert_eq!(store.prune(Duration::MAX).unwrap(), 0);
        assert!(store.get("done").unwrap().is_some());
    }
}
