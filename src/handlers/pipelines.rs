//! Handlers adapting the generation pipelines to the job system

use async_trait::async_trait;

use super::traits::JobHandler;
use crate::jobs::{JobError, JobKind, JobOutput, JobPayload};
use crate::pipeline::{ContentGenerator, NicheAnalyzer};

fn mismatch(expected: JobKind, payload: &JobPayload) -> JobError {
    JobError::InvalidPayload(format!(
        "{expected} handler received a {} payload",
        payload.kind()
    ))
}

pub struct ContentHandler {
    generator: ContentGenerator,
}

impl ContentHandler {
    pub fn new(generator: ContentGenerator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl JobHandler for ContentHandler {
    fn kind(&self) -> JobKind {
        JobKind::ContentGeneration
    }

    async fn execute(&self, payload: &JobPayload) -> Result<JobOutput, JobError> {
        let JobPayload::ContentGeneration(request) = payload else {
            return Err(mismatch(self.kind(), payload));
        };
        Ok(JobOutput::Content(self.generator.generate(request).await?))
    }
}

pub struct NicheHandler {
    analyzer: NicheAnalyzer,
}

impl NicheHandler {
    pub fn new(analyzer: NicheAnalyzer) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl JobHandler for NicheHandler {
    fn kind(&self) -> JobKind {
        JobKind::NicheAnalysis
    }

    async fn execute(&self, payload: &JobPayload) -> Result<JobOutput, JobError> {
        let JobPayload::NicheAnalysis(request) = payload else {
            return Err(mismatch(self.kind(), payload));
        };
        Ok(JobOutput::Niche(self.analyzer.analyze(request).await?))
    }
}
