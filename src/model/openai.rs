//! OpenAI-compatible chat and image client

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{
    GeneratedImage, ImageGenerator, InvokeOptions, LanguageModel, Message, ModelError, ModelReply,
    Result,
};
use crate::config::ModelConfig;

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    image_model: String,
    image_size: String,
    temperature: Option<f32>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = ModelConfig::default();
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: defaults.base_url,
            chat_model: defaults.chat_model,
            image_model: defaults.image_model,
            image_size: defaults.image_size,
            temperature: defaults.temperature,
        }
    }

    /// Build a client from configuration; the API key comes from the environment
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ModelError::Config("OPENAI_API_KEY not set".into()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ModelError::Config(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size.clone(),
            temperature: config.temperature,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<R> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(path, error = %e, "Model request failed");
                ModelError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(path, status = %status, error = %error_text, "Model API error");
            return Err(ModelError::Api(format!("HTTP {}: {}", status.as_u16(), error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| ModelError::Response(e.to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn invoke(&self, messages: &[Message], options: InvokeOptions) -> Result<ModelReply> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.chat_model,
            messages,
            temperature: self.temperature,
            response_format: options.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response: ChatResponse = self.post("/chat/completions", &request).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| ModelError::Response("no choices in completion".into()))?;

        debug!(
            model = %self.chat_model,
            json_mode = options.json_mode,
            duration_ms = start.elapsed().as_millis() as u64,
            reply_chars = text.len(),
            "Chat completion"
        );

        Ok(ModelReply { text })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        let request = ImageRequest {
            model: &self.image_model,
            prompt,
            n: 1,
            size: &self.image_size,
        };

        let response: ImageResponse = self.post("/images/generations", &request).await?;
        response
            .data
            .into_iter()
            .find_map(|d| d.url)
            .map(|url| GeneratedImage { url })
            .ok_or_else(|| ModelError::Response("image response contained no url".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new("sk-test").with_base_url(server.uri())
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = ModelConfig::default();
        assert!(matches!(
            OpenAiClient::from_config(&config),
            Err(ModelError::Config(_))
        ));
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let client = OpenAiClient::new("sk-test").with_base_url("https://llm.internal/v1/");
        assert_eq!(client.base_url(), "https://llm.internal/v1");
    }

    #[tokio::test]
    async fn test_invoke_sends_json_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "response_format": {"type": "json_object"},
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server)
            .invoke(&[Message::user("hi")], InvokeOptions::json())
            .await
            .unwrap();
        assert_eq!(reply.text, "{\"ok\": true}");
    }

    #[tokio::test]
    async fn test_invoke_maps_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client(&server)
            .invoke(
                &[Message {
                    role: Role::User,
                    content: "hi".into(),
                }],
                InvokeOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Api(msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn test_generate_image_returns_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"url": "https://images.example/1.png"}]
            })))
            .mount(&server)
            .await;

        let image = client(&server).generate("a loaf of bread").await.unwrap();
        assert_eq!(image.url, "https://images.example/1.png");
    }
}
