//! Job execution router
//!
//! Jobs move `pending → active → {completed | failed}`. `unknown` is reported
//! when status cannot be determined (broker unreachable, id not found) and
//! means the caller should ask again, never that the job failed.
//!
//! ```rust,ignore
//! let router = JobRouter::direct(registry);
//! let submission = router.submit(JobKind::ContentGeneration, request.into()).await?;
//! match submission.result {
//!     Some(result) => { /* ran directly */ }
//!     None => { /* poll router.status(kind, &submission.job_id) */ }
//! }
//! ```

mod error;
mod models;
mod router;
mod strategy;

pub use error::JobError;
pub use models::{
    DIRECT_ID_PREFIX, ExecutionMode, JobKind, JobOutput, JobPayload, JobSnapshot, JobStatus,
    QueuePolicy, StatusReport, Submission,
};
pub use router::JobRouter;
pub use strategy::{
    Broker, CompletionObserver, DirectExecution, ExecutionStrategy, NoopObserver, QueuedExecution,
};
