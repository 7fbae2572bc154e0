use thiserror::Error;

use crate::ledger::LedgerError;
use crate::model::ModelError;
use crate::pipeline::{AnalysisError, GenerationError};
use crate::platform::UnknownPlatform;
use crate::queue::QueueError;
use crate::scrape::ScrapeError;

#[derive(Debug, Error)]
pub enum JobError {
    /// Unknown platform, missing credentials, unregistered handler
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("content generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("niche analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<UnknownPlatform> for JobError {
    fn from(err: UnknownPlatform) -> Self {
        JobError::Configuration(err.to_string())
    }
}

impl JobError {
    /// Whether a later attempt could succeed.
    ///
    /// Configuration problems and bad input fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::Configuration(_) | JobError::InvalidPayload(_) => false,
            JobError::Generation(GenerationError::EmptyTopic) => false,
            JobError::Generation(GenerationError::Model(ModelError::Config(_))) => false,
            JobError::Analysis(AnalysisError::Model(ModelError::Config(_))) => false,
            JobError::Analysis(AnalysisError::Scrape(ScrapeError::InvalidUrl { .. })) => false,
            _ => true,
        }
    }

    /// Short machine-readable code, used for dead letters and API errors
    pub fn code(&self) -> &'static str {
        match self {
            JobError::Configuration(_) => "CONFIGURATION",
            JobError::InvalidPayload(_) => "INVALID_PAYLOAD",
            JobError::Generation(_) => "GENERATION_FAILED",
            JobError::Analysis(AnalysisError::Scrape(_)) => "SCRAPE_FAILED",
            JobError::Analysis(_) => "ANALYSIS_FAILED",
            JobError::Queue(_) => "QUEUE_ERROR",
            JobError::Ledger(_) => "LEDGER_ERROR",
        }
    }
}
