//! Request and response bodies for the HTTP surface.
//!
//! Job submission bodies are the pipeline request types themselves
//! ([`ContentGenerationRequest`](crate::pipeline::ContentGenerationRequest),
//! [`NicheAnalysisRequest`](crate::pipeline::NicheAnalysisRequest)) and the
//! answers are [`Submission`](crate::jobs::Submission) and
//! [`StatusReport`](crate::jobs::StatusReport).
//!
//! A content submission (as JSON):
//!
//! ```json
//! {
//!   "topic": "Autumn menu launch",
//!   "platform": "instagram",
//!   "tone": "friendly",
//!   "include_image": true,
//!   "image_style": "warm film photo"
//! }
//! ```
//!
//! answered in direct mode with
//!
//! ```json
//! {
//!   "job_id": "direct-5f0c...",
//!   "mode": "direct",
//!   "result": { "body": "...", "hashtags": ["#autumn"], "platform": "instagram", "...": "..." }
//! }
//! ```
//!
//! and in queued mode with `"mode": "queued"` and `"result": null`.

use serde::{Deserialize, Serialize};

use crate::jobs::ExecutionMode;
use crate::observability::MetricsSnapshot;

/// Body of `POST /validate/content`.
///
/// `platform` is a raw key so unknown platforms come back as an issue
/// instead of a rejected request. `character_count` defaults to the count
/// the generator would report.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidateContentRequest {
    pub platform: String,
    pub body: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub character_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub mode: ExecutionMode,
    pub jobs: MetricsSnapshot,
    pub version: String,
}
