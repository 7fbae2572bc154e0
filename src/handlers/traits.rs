use async_trait::async_trait;

use crate::jobs::{JobError, JobKind, JobOutput, JobPayload};

/// Runs one job payload to completion.
///
/// Handlers are stateless between calls; the same instance serves direct
/// execution and every queue worker of its kind.
#[async_trait]
pub trait JobHandler: Send + Sync {
    fn kind(&self) -> JobKind;

    async fn execute(&self, payload: &JobPayload) -> Result<JobOutput, JobError>;
}
