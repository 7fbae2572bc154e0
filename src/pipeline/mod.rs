//! The two generation pipelines.
//!
//! Both are stateless: they borrow their request, own nothing between runs
//! and hand their result back to the caller.

mod content;
mod niche;
mod types;

pub use content::{ContentGenerator, GenerationError, character_count};
pub use niche::{AnalysisError, NicheAnalyzer, derive_autopilot};
pub use types::{
    AutopilotConfig, BrandVoice, ContentGenerationRequest, ContentStrategy, GeneratedContent,
    NicheAnalysisRequest, NicheAnalysisResult, NicheContext, TargetAudience, Tone,
};
