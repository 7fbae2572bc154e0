//! Language model and image generation collaborators
//!
//! The pipelines only see the [`LanguageModel`] and [`ImageGenerator`]
//! traits. [`OpenAiClient`] talks to any OpenAI-compatible endpoint; the
//! `mock` module provides scripted doubles.

pub mod mock;
mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Missing API key, invalid base url
    #[error("model configuration error: {0}")]
    Config(String),

    #[error("model network error: {0}")]
    Network(String),

    /// Non-2xx response, rate limit, rejected request
    #[error("model API error: {0}")]
    Api(String),

    #[error("unexpected model response: {0}")]
    Response(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Ask the backend to reply with a single JSON object
    pub json_mode: bool,
}

impl InvokeOptions {
    pub fn json() -> Self {
        Self { json_mode: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub url: String,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, messages: &[Message], options: InvokeOptions) -> Result<ModelReply>;
}

/// Best-effort image generation; callers treat every error as "no image"
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage>;
}
