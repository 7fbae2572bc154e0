//! Content generation: prompt, model call, lenient parse, platform checks.

use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{ContentGenerationRequest, GeneratedContent, NicheContext};
use crate::model::{ImageGenerator, InvokeOptions, LanguageModel, Message, ModelError};
use crate::parser::{ParseError, parse_model_json};
use crate::platform::PlatformSpec;

const SYSTEM_PROMPT: &str = "You are an expert social media copywriter. \
You always answer with a single JSON object and nothing else.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("could not parse generated content: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Shape the model is asked to reply with
#[derive(Debug, Deserialize)]
struct Draft {
    #[serde(alias = "content")]
    body: String,
    #[serde(default)]
    hashtags: Vec<String>,
}

#[derive(Clone)]
pub struct ContentGenerator {
    model: Arc<dyn LanguageModel>,
    images: Option<Arc<dyn ImageGenerator>>,
}

impl ContentGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            images: None,
        }
    }

    pub fn with_images(mut self, images: Arc<dyn ImageGenerator>) -> Self {
        self.images = Some(images);
        self
    }

    pub async fn generate(
        &self,
        request: &ContentGenerationRequest,
    ) -> Result<GeneratedContent, GenerationError> {
        if request.topic.trim().is_empty() {
            return Err(GenerationError::EmptyTopic);
        }

        let spec = request.platform.spec();
        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(build_prompt(request, spec)),
        ];

        let reply = self.model.invoke(&messages, InvokeOptions::json()).await?;
        if reply.text.trim().is_empty() {
            warn!(platform = %request.platform, "Model returned empty content");
            return Err(GenerationError::EmptyResponse);
        }

        let draft: Draft = parse_model_json(&reply.text)?;
        let hashtags = normalize_hashtags(draft.hashtags);
        let body = draft.body.trim().to_string();
        let character_count = character_count(&body, &hashtags);

        let mut warnings = Vec::new();
        if character_count > spec.max_length {
            warn!(
                platform = %request.platform,
                character_count,
                max_length = spec.max_length,
                "Generated content exceeds platform maximum"
            );
            warnings.push(format!(
                "Content exceeds {} maximum length ({}/{})",
                spec.platform, character_count, spec.max_length
            ));
        }

        let (image_url, image_prompt) = if request.include_image {
            let prompt = image_prompt(request);
            (self.request_image(&prompt).await, Some(prompt))
        } else {
            (None, None)
        };

        info!(
            platform = %request.platform,
            character_count,
            hashtags = hashtags.len(),
            has_image = image_url.is_some(),
            "Content generated"
        );

        Ok(GeneratedContent {
            body,
            hashtags,
            image_url,
            image_prompt,
            platform: request.platform,
            character_count,
            warnings,
        })
    }

    async fn request_image(&self, prompt: &str) -> Option<String> {
        let Some(images) = &self.images else {
            debug!("Image requested but no image generator configured");
            return None;
        };

        match images.generate(prompt).await {
            Ok(image) => Some(image.url),
            Err(e) => {
                warn!(error = %e, "Image generation failed, continuing without image");
                None
            }
        }
    }
}

/// Body length plus the length of the space-joined hashtags, in chars
pub fn character_count(body: &str, hashtags: &[String]) -> usize {
    body.chars().count() + hashtags.join(" ").chars().count()
}

fn normalize_hashtags(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|tag| tag.trim().trim_start_matches('#').trim().to_string())
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{}", tag.replace(char::is_whitespace, "")))
        .collect()
}

fn image_prompt(request: &ContentGenerationRequest) -> String {
    match request.image_style.as_deref().map(str::trim) {
        Some(style) if !style.is_empty() => format!("{}, {} style", request.topic.trim(), style),
        _ => request.topic.trim().to_string(),
    }
}

fn build_prompt(request: &ContentGenerationRequest, spec: &PlatformSpec) -> String {
    let mut prompt = format!(
        "Write a {} post about: {}\n\nTone: {}\n",
        spec.platform,
        request.topic.trim(),
        request.tone
    );

    if let Some(context) = &request.niche_context {
        push_context(&mut prompt, context);
    }

    // write! to a String cannot fail
    let _ = write!(
        prompt,
        "\nPlatform requirements:\n\
         - Aim for about {} characters (hard limit {})\n\
         - Use at most {} hashtags\n\
         - {}\n\n\
         Respond with only a JSON object of the form \
         {{\"body\": \"post text without hashtags\", \"hashtags\": [\"#tag\"]}}",
        spec.optimal_length, spec.max_length, spec.hashtag_limit, spec.guidance
    );

    prompt
}

fn push_context(prompt: &mut String, context: &NicheContext) {
    prompt.push_str("\nBusiness context:\n");

    if let Some(industry) = context.industry.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(prompt, "- Industry: {industry}");
    }
    if let Some(voice) = &context.brand_voice {
        if !voice.tone.is_empty() {
            let _ = writeln!(prompt, "- Brand voice: {}", voice.tone);
        }
        if !voice.writing_style.is_empty() {
            let _ = writeln!(prompt, "- Writing style: {}", voice.writing_style);
        }
        if !voice.keywords.is_empty() {
            let _ = writeln!(prompt, "- Brand keywords: {}", voice.keywords.join(", "));
        }
    }
    if let Some(audience) = &context.target_audience {
        if !audience.demographics.is_empty() {
            let _ = writeln!(prompt, "- Audience: {}", audience.demographics);
        }
        if !audience.pain_points.is_empty() {
            let _ = writeln!(prompt, "- Audience pain points: {}", audience.pain_points.join(", "));
        }
        if !audience.interests.is_empty() {
            let _ = writeln!(prompt, "- Audience interests: {}", audience.interests.join(", "));
        }
    }
    if !context.keywords.is_empty() {
        let _ = writeln!(prompt, "- Keywords to weave in: {}", context.keywords.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock::{ScriptedModel, StaticImageGenerator};
    use crate::pipeline::{BrandVoice, Tone};
    use crate::platform::Platform;

    fn request(platform: Platform) -> ContentGenerationRequest {
        ContentGenerationRequest::builder()
            .topic("Fresh sourdough every morning")
            .platform(platform)
            .build()
    }

    #[tokio::test]
    async fn test_generate_parses_reply_and_counts_chars() {
        let model = Arc::new(ScriptedModel::replying(
            r##"{"body": "Warm bread, 7am.", "hashtags": ["bread", "#local"]}"##,
        ));
        let generator = ContentGenerator::new(model.clone());

        let content = generator.generate(&request(Platform::Twitter)).await.unwrap();

        assert_eq!(content.body, "Warm bread, 7am.");
        assert_eq!(content.hashtags, vec!["#bread", "#local"]);
        assert_eq!(content.platform, Platform::Twitter);
        assert_eq!(content.character_count, 16 + "#bread #local".len());
        assert!(content.warnings.is_empty());
        assert!(content.image_url.is_none());
        assert_eq!(model.options(), vec![InvokeOptions::json()]);
    }

    #[tokio::test]
    async fn test_prompt_carries_platform_rules_and_context() {
        let model = Arc::new(ScriptedModel::replying(r#"{"body": "hi", "hashtags": []}"#));
        let generator = ContentGenerator::new(model.clone());

        let mut req = request(Platform::Linkedin);
        req.tone = Tone::Educational;
        req.niche_context = Some(NicheContext {
            industry: Some("Artisan bakery".into()),
            brand_voice: Some(BrandVoice {
                tone: "warm".into(),
                keywords: vec!["sourdough".into()],
                writing_style: String::new(),
            }),
            target_audience: None,
            keywords: vec!["rye".into()],
        });

        generator.generate(&req).await.unwrap();

        let prompt = &model.prompts()[0];
        assert!(prompt.contains("Fresh sourdough every morning"));
        assert!(prompt.contains("Tone: educational"));
        assert!(prompt.contains("about 1300 characters"));
        assert!(prompt.contains("at most 5 hashtags"));
        assert!(prompt.contains("Industry: Artisan bakery"));
        assert!(prompt.contains("Brand keywords: sourdough"));
        assert!(prompt.contains("rye"));
        assert!(prompt.contains("\"body\""));
    }

    #[tokio::test]
    async fn test_prose_wrapped_reply_is_recovered() {
        let model = Arc::new(ScriptedModel::replying(
            "Sure! Here it is:\n{\"body\": \"Hello\", \"hashtags\": []}\nEnjoy.",
        ));
        let content = ContentGenerator::new(model)
            .generate(&request(Platform::Facebook))
            .await
            .unwrap();
        assert_eq!(content.body, "Hello");
    }

    #[tokio::test]
    async fn test_empty_reply_is_error() {
        let model = Arc::new(ScriptedModel::replying("   "));
        let err = ContentGenerator::new(model)
            .generate(&request(Platform::Tiktok))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_parse_error() {
        let model = Arc::new(ScriptedModel::replying("I cannot help with that."));
        let err = ContentGenerator::new(model)
            .generate(&request(Platform::Tiktok))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Parse(_)));
    }

    #[tokio::test]
    async fn test_empty_topic_rejected_before_model_call() {
        let model = Arc::new(ScriptedModel::replying(r#"{"body": "x"}"#));
        let mut req = request(Platform::Twitter);
        req.topic = "  ".into();

        let err = ContentGenerator::new(model.clone()).generate(&req).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyTopic));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_overlong_body_is_warning_not_error() {
        let body = "A".repeat(300);
        let model = Arc::new(ScriptedModel::replying(format!(
            r#"{{"body": "{body}", "hashtags": []}}"#
        )));
        let content = ContentGenerator::new(model)
            .generate(&request(Platform::Twitter))
            .await
            .unwrap();

        assert_eq!(content.character_count, 300);
        assert_eq!(content.warnings.len(), 1);
        assert!(content.warnings[0].contains("300/280"));
    }

    #[tokio::test]
    async fn test_image_failure_is_swallowed() {
        let model = Arc::new(ScriptedModel::replying(r#"{"body": "hi", "hashtags": []}"#));
        let images = Arc::new(StaticImageGenerator::failing());
        let generator = ContentGenerator::new(model).with_images(images.clone());

        let mut req = request(Platform::Instagram);
        req.include_image = true;
        req.image_style = Some("watercolor".into());

        let content = generator.generate(&req).await.unwrap();
        assert!(content.image_url.is_none());
        assert_eq!(
            content.image_prompt.as_deref(),
            Some("Fresh sourdough every morning, watercolor style")
        );
        assert_eq!(images.call_count(), 1);
    }

    #[tokio::test]
    async fn test_image_url_attached() {
        let model = Arc::new(ScriptedModel::replying(r#"{"body": "hi", "hashtags": []}"#));
        let images = Arc::new(StaticImageGenerator::returning("https://img.example/1.png"));
        let generator = ContentGenerator::new(model).with_images(images);

        let mut req = request(Platform::Instagram);
        req.include_image = true;

        let content = generator.generate(&req).await.unwrap();
        assert_eq!(content.image_url.as_deref(), Some("https://img.example/1.png"));
    }

    #[tokio::test]
    async fn test_request_is_not_mutated() {
        let model = Arc::new(ScriptedModel::replying(r#"{"body": "hi", "hashtags": ["a"]}"#));
        let req = request(Platform::Twitter);
        let before = req.clone();
        ContentGenerator::new(model).generate(&req).await.unwrap();
        assert_eq!(req, before);
    }

    #[test]
    fn test_normalize_hashtags() {
        let tags = normalize_hashtags(vec![
            " bread ".into(),
            "#local".into(),
            "".into(),
            "#".into(),
            "small business".into(),
        ]);
        assert_eq!(tags, vec!["#bread", "#local", "#smallbusiness"]);
    }
}
