use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Durable broker; absent means every job runs directly
    #[serde(default)]
    pub broker: Option<BrokerConfig>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024 // 1 MB
}

/// Fjall-backed broker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrokerConfig {
    #[serde(default = "default_queue_path")]
    pub queue_path: PathBuf,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    /// Bounded channel size per worker
    #[serde(default = "default_channel_size")]
    pub channel_size: usize,
    /// Completed and failed snapshots older than this are pruned
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    #[serde(default)]
    pub content_generation: QueuePolicyConfig,
    #[serde(default)]
    pub niche_analysis: QueuePolicyConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            queue_path: default_queue_path(),
            ledger_path: default_ledger_path(),
            channel_size: default_channel_size(),
            retention_hours: default_retention_hours(),
            content_generation: QueuePolicyConfig::default(),
            niche_analysis: QueuePolicyConfig::default(),
        }
    }
}

fn default_queue_path() -> PathBuf {
    PathBuf::from("data/queue")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("data/ledger")
}

fn default_channel_size() -> usize {
    100
}

fn default_retention_hours() -> u64 {
    7 * 24
}

impl BrokerConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours.saturating_mul(60 * 60))
    }
}

/// Per-queue overrides; unset fields fall back to the job kind's defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueuePolicyConfig {
    pub attempts: Option<u32>,
    pub backoff_ms: Option<u64>,
    pub concurrency: Option<usize>,
}

/// Model backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_image_size")]
    pub image_size: String,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Loaded from environment, never from the config file
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            image_size: default_image_size(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.7)
}

fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Page scraper limits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    #[serde(default = "default_max_links")]
    pub max_links: usize,
    #[serde(default = "default_max_html_bytes")]
    pub max_html_bytes: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ScraperConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: default_navigation_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_text_chars: default_max_text_chars(),
            max_links: default_max_links(),
            max_html_bytes: default_max_html_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_text_chars() -> usize {
    50_000
}

fn default_max_links() -> usize {
    50
}

fn default_max_html_bytes() -> usize {
    5 * 1024 * 1024 // 5 MB
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "postforge=info,tower_http=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert!(config.broker.is_none());
        assert_eq!(config.scraper.navigation_timeout(), Duration::from_secs(30));
        assert_eq!(config.scraper.max_text_chars, 50_000);
        assert_eq!(config.scraper.max_links, 50);
        assert!(config.image.enabled);
        assert!(config.model.api_key.is_none());
    }

    #[test]
    fn test_broker_section_alone_enables_broker() {
        let config: Config = toml::from_str("[broker]\n").unwrap();
        let broker = config.broker.unwrap();
        assert_eq!(broker.channel_size, 100);
        assert!(broker.content_generation.concurrency.is_none());
    }
}
