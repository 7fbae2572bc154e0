//! Scripted model doubles for tests and offline runs

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{
    GeneratedImage, ImageGenerator, InvokeOptions, LanguageModel, Message, ModelError, ModelReply,
    Result,
};

#[derive(Debug, Clone)]
enum Step {
    Reply(String),
    Fail(String),
}

/// Model that replays a fixed script of replies.
///
/// Once the script is exhausted the last step repeats. Every invocation is
/// recorded so tests can assert on prompts.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: Mutex<Vec<(Vec<Message>, InvokeOptions)>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new().then_reply(text)
    }

    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.push(Step::Reply(text.into()))
    }

    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Step::Fail(message.into()))
    }

    fn push(self, step: Step) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(step);
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Concatenated message contents of every invocation so far
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .map(|(messages, _)| {
                        messages
                            .iter()
                            .map(|m| m.content.as_str())
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn options(&self) -> Vec<InvokeOptions> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|(_, o)| *o).collect())
            .unwrap_or_default()
    }

    fn next_step(&self) -> Option<Step> {
        let mut script = self.script.lock().ok()?;
        let mut last = self.last.lock().ok()?;
        if let Some(step) = script.pop_front() {
            *last = Some(step);
        }
        last.clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn invoke(&self, messages: &[Message], options: InvokeOptions) -> Result<ModelReply> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((messages.to_vec(), options));
        }

        match self.next_step() {
            Some(Step::Reply(text)) => Ok(ModelReply { text }),
            Some(Step::Fail(message)) => Err(ModelError::Api(message)),
            None => Err(ModelError::Response("scripted model has no replies".into())),
        }
    }
}

/// Image generator returning a fixed url, or always failing
#[derive(Debug)]
pub struct StaticImageGenerator {
    url: Option<String>,
    calls: AtomicUsize,
}

impl StaticImageGenerator {
    pub fn returning(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            url: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for StaticImageGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.url
            .clone()
            .map(|url| GeneratedImage { url })
            .ok_or_else(|| ModelError::Api("image backend unavailable".into()))
    }
}
