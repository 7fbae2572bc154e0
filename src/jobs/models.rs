use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::error::JobError;
use crate::config::QueuePolicyConfig;
use crate::pipeline::{
    ContentGenerationRequest, GeneratedContent, NicheAnalysisRequest, NicheAnalysisResult,
};
use crate::scrape::parse_target;

/// Prefix marking ids of jobs that ran in-process
pub const DIRECT_ID_PREFIX: &str = "direct-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    ContentGeneration,
    NicheAnalysis,
}

impl JobKind {
    pub const ALL: [JobKind; 2] = [JobKind::ContentGeneration, JobKind::NicheAnalysis];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::ContentGeneration => "content-generation",
            JobKind::NicheAnalysis => "niche-analysis",
        }
    }

    /// Retry and concurrency defaults for the kind's queue.
    ///
    /// Generation is model-call bound, analysis is scraping bound.
    pub fn default_policy(&self) -> QueuePolicy {
        match self {
            JobKind::ContentGeneration => QueuePolicy {
                max_attempts: 3,
                backoff_base: Duration::from_secs(2),
                concurrency: 5,
            },
            JobKind::NicheAnalysis => QueuePolicy {
                max_attempts: 2,
                backoff_base: Duration::from_secs(5),
                concurrency: 2,
            },
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| JobError::InvalidPayload(format!("unknown job kind '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Queued,
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Active,
    Completed,
    Failed,
    /// Status cannot be determined right now; the caller should query again
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Retry and concurrency policy for one job kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub concurrency: usize,
}

impl QueuePolicy {
    /// Apply configured overrides on top of `self`
    pub fn with_overrides(mut self, overrides: &QueuePolicyConfig) -> Self {
        if let Some(attempts) = overrides.attempts {
            self.max_attempts = attempts;
        }
        if let Some(ms) = overrides.backoff_ms {
            self.backoff_base = Duration::from_millis(ms);
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        self
    }

    /// Delay before attempt `attempt + 1`: `base * 2^(attempt - 1)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(1u32 << exponent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum JobPayload {
    ContentGeneration(ContentGenerationRequest),
    NicheAnalysis(NicheAnalysisRequest),
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::ContentGeneration(_) => JobKind::ContentGeneration,
            JobPayload::NicheAnalysis(_) => JobKind::NicheAnalysis,
        }
    }

    /// Checks that can reject a job before any work starts
    pub fn precheck(&self) -> Result<(), JobError> {
        match self {
            JobPayload::ContentGeneration(request) if request.topic.trim().is_empty() => {
                Err(JobError::InvalidPayload("topic must not be empty".into()))
            }
            JobPayload::NicheAnalysis(request) => parse_target(&request.website_url)
                .map(|_| ())
                .map_err(|e| JobError::InvalidPayload(e.to_string())),
            JobPayload::ContentGeneration(_) => Ok(()),
        }
    }
}

impl From<ContentGenerationRequest> for JobPayload {
    fn from(request: ContentGenerationRequest) -> Self {
        JobPayload::ContentGeneration(request)
    }
}

impl From<NicheAnalysisRequest> for JobPayload {
    fn from(request: NicheAnalysisRequest) -> Self {
        JobPayload::NicheAnalysis(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutput {
    Content(GeneratedContent),
    Niche(NicheAnalysisResult),
}

impl JobOutput {
    pub fn as_content(&self) -> Option<&GeneratedContent> {
        match self {
            JobOutput::Content(content) => Some(content),
            JobOutput::Niche(_) => None,
        }
    }

    pub fn as_niche(&self) -> Option<&NicheAnalysisResult> {
        match self {
            JobOutput::Niche(result) => Some(result),
            JobOutput::Content(_) => None,
        }
    }
}

/// Ledger record for a broker-backed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: String,
    pub kind: JobKind,
    pub mode: ExecutionMode,
    pub status: JobStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    #[serde(default)]
    pub result: Option<JobOutput>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl JobSnapshot {
    pub fn pending(job_id: impl Into<String>, kind: JobKind, max_attempts: u32) -> Self {
        let now = chrono::Utc::now();
        Self {
            job_id: job_id.into(),
            kind,
            mode: ExecutionMode::Queued,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn report(&self) -> StatusReport {
        StatusReport {
            job_id: self.job_id.clone(),
            kind: self.kind,
            status: self.status,
            attempts: self.attempts,
            result: self.result.clone(),
            error: self.error.clone(),
            note: None,
        }
    }
}

/// Answer to `submit`; `result` is only populated when the job ran directly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub job_id: String,
    pub mode: ExecutionMode,
    pub result: Option<JobOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub job_id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub attempts: u32,
    pub result: Option<JobOutput>,
    pub error: Option<String>,
    pub note: Option<String>,
}

impl StatusReport {
    pub fn unknown(kind: JobKind, job_id: &str, note: impl Into<String>) -> Self {
        Self {
            job_id: job_id.to_string(),
            kind,
            status: JobStatus::Unknown,
            attempts: 0,
            result: None,
            error: None,
            note: Some(note.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in JobKind::ALL {
            assert_eq!(kind.as_str().parse::<JobKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{}\"", kind.as_str())
            );
        }
        assert!("publish".parse::<JobKind>().is_err());
    }

    #[test]
    fn test_default_policies() {
        let content = JobKind::ContentGeneration.default_policy();
        assert_eq!(content.max_attempts, 3);
        assert_eq!(content.backoff_base, Duration::from_secs(2));
        assert_eq!(content.concurrency, 5);

        let niche = JobKind::NicheAnalysis.default_policy();
        assert_eq!(niche.max_attempts, 2);
        assert_eq!(niche.backoff_base, Duration::from_secs(5));
        assert_eq!(niche.concurrency, 2);
    }

    #[test]
    fn test_backoff_is_exponential() {
        let policy = JobKind::ContentGeneration.default_policy();
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn test_overrides_apply_per_field() {
        let policy = JobKind::NicheAnalysis
            .default_policy()
            .with_overrides(&QueuePolicyConfig {
                attempts: None,
                backoff_ms: Some(10),
                concurrency: Some(4),
            });
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.backoff_base, Duration::from_millis(10));
        assert_eq!(policy.concurrency, 4);
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = JobPayload::from(NicheAnalysisRequest::new("https://bakery.example"));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "niche-analysis");
        assert_eq!(json["payload"]["website_url"], "https://bakery.example");

        let back: JobPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_precheck() {
        let empty_topic = JobPayload::from(
            ContentGenerationRequest::builder()
                .topic(" ")
                .platform(Platform::Twitter)
                .build(),
        );
        assert!(matches!(empty_topic.precheck(), Err(JobError::InvalidPayload(_))));

        let relative = JobPayload::from(NicheAnalysisRequest::new("/about"));
        assert!(matches!(relative.precheck(), Err(JobError::InvalidPayload(_))));

        let fine = JobPayload::from(NicheAnalysisRequest::new("https://bakery.example"));
        assert!(fine.precheck().is_ok());
    }

    #[test]
    fn test_output_untagged_decoding_picks_variant() {
        let content = serde_json::json!({
            "body": "hi",
            "hashtags": [],
            "platform": "twitter",
            "character_count": 2
        });
        let output: JobOutput = serde_json::from_value(content).unwrap();
        assert!(output.as_content().is_some());

        let niche = serde_json::json!({"industry": "Bakery"});
        let output: JobOutput = serde_json::from_value(niche).unwrap();
        assert_eq!(output.as_niche().unwrap().industry, "Bakery");
    }
}
