use super::models::{BrokerConfig, Config, QueuePolicyConfig};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("max_payload_bytes ({actual}) exceeds limit of 5MB ({limit})")]
    PayloadSizeExceedsLimit { actual: usize, limit: usize },

    #[error("{field} must be positive")]
    NotPositive { field: String },

    #[error("Temperature {value} out of range, expected 0.0..=2.0")]
    TemperatureOutOfRange { value: f32 },

    #[error("Invalid model base_url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_payload_size(config)?;
    validate_model(config)?;
    validate_scraper(config)?;
    if let Some(broker) = &config.broker {
        validate_broker(broker)?;
    }
    Ok(())
}

fn positive(field: &str, value: u64) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::NotPositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn validate_payload_size(config: &Config) -> Result<(), ValidationError> {
    const MAX_PAYLOAD_BYTES: usize = 5 * 1024 * 1024; // 5 MB

    positive("server.max_payload_bytes", config.server.max_payload_bytes as u64)?;
    if config.server.max_payload_bytes > MAX_PAYLOAD_BYTES {
        return Err(ValidationError::PayloadSizeExceedsLimit {
            actual: config.server.max_payload_bytes,
            limit: MAX_PAYLOAD_BYTES,
        });
    }

    Ok(())
}

fn validate_model(config: &Config) -> Result<(), ValidationError> {
    let model = &config.model;

    match Url::parse(&model.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => {
            return Err(ValidationError::InvalidBaseUrl {
                url: model.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Err(e) => {
            return Err(ValidationError::InvalidBaseUrl {
                url: model.base_url.clone(),
                reason: e.to_string(),
            });
        }
    }

    if let Some(value) = model.temperature {
        if !(0.0..=2.0).contains(&value) {
            return Err(ValidationError::TemperatureOutOfRange { value });
        }
    }

    positive("model.request_timeout_secs", model.request_timeout_secs)
}

fn validate_scraper(config: &Config) -> Result<(), ValidationError> {
    let scraper = &config.scraper;
    positive("scraper.navigation_timeout_secs", scraper.navigation_timeout_secs)?;
    positive("scraper.connect_timeout_secs", scraper.connect_timeout_secs)?;
    positive("scraper.max_text_chars", scraper.max_text_chars as u64)?;
    positive("scraper.max_html_bytes", scraper.max_html_bytes as u64)
}

fn validate_broker(broker: &BrokerConfig) -> Result<(), ValidationError> {
    positive("broker.channel_size", broker.channel_size as u64)?;
    positive("broker.retention_hours", broker.retention_hours)?;
    validate_policy("broker.content_generation", &broker.content_generation)?;
    validate_policy("broker.niche_analysis", &broker.niche_analysis)
}

fn validate_policy(section: &str, policy: &QueuePolicyConfig) -> Result<(), ValidationError> {
    if let Some(attempts) = policy.attempts {
        positive(&format!("{section}.attempts"), attempts as u64)?;
    }
    if let Some(concurrency) = policy.concurrency {
        positive(&format!("{section}.concurrency"), concurrency as u64)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_oversized_payload_limit() {
        let mut config = Config::default();
        config.server.max_payload_bytes = 10 * 1024 * 1024;

        assert!(matches!(
            validate(&config),
            Err(ValidationError::PayloadSizeExceedsLimit { .. })
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = Config::default();
        let mut broker = BrokerConfig::default();
        broker.niche_analysis.attempts = Some(0);
        config.broker = Some(broker);

        match validate(&config) {
            Err(ValidationError::NotPositive { field }) => {
                assert_eq!(field, "broker.niche_analysis.attempts")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_zero_retention_rejected() {
        let mut config = Config::default();
        config.broker = Some(BrokerConfig {
            retention_hours: 0,
            ..BrokerConfig::default()
        });

        match validate(&config) {
            Err(ValidationError::NotPositive { field }) => {
                assert_eq!(field, "broker.retention_hours")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        let mut broker = BrokerConfig::default();
        broker.content_generation.concurrency = Some(0);
        config.broker = Some(broker);

        assert!(matches!(
            validate(&config),
            Err(ValidationError::NotPositive { .. })
        ));
    }

    #[test]
    fn test_temperature_out_of_range() {
        let mut config = Config::default();
        config.model.temperature = Some(3.5);

        assert!(matches!(
            validate(&config),
            Err(ValidationError::TemperatureOutOfRange { .. })
        ));
    }

    #[test]
    fn test_bad_base_url() {
        let mut config = Config::default();
        config.model.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBaseUrl { .. })
        ));

        config.model.base_url = "ftp://models.internal".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_zero_navigation_timeout() {
        let mut config = Config::default();
        config.scraper.navigation_timeout_secs = 0;

        assert!(matches!(
            validate(&config),
            Err(ValidationError::NotPositive { .. })
        ));
    }
}
