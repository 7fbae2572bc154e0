use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use super::pipelines::{ContentHandler, NicheHandler};
use super::traits::JobHandler;
use crate::config::Config;
use crate::jobs::{JobError, JobKind};
use crate::model::OpenAiClient;
use crate::pipeline::{ContentGenerator, NicheAnalyzer};
use crate::scrape::{HttpBrowser, PageScraper};

/// Registry mapping job kinds to handler instances
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<JobKind, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in pipeline handlers
    pub fn with_pipelines(content: ContentGenerator, niche: NicheAnalyzer) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ContentHandler::new(content)));
        registry.register(Arc::new(NicheHandler::new(niche)));
        registry
    }

    /// Registry backed by the configured model endpoint and the HTTP browser.
    ///
    /// Fails when no API key is available.
    pub fn from_config(config: &Config) -> Result<Self, JobError> {
        let client = Arc::new(
            OpenAiClient::from_config(&config.model)
                .map_err(|e| JobError::Configuration(e.to_string()))?,
        );

        let mut content = ContentGenerator::new(client.clone());
        if config.image.enabled {
            content = content.with_images(client.clone());
        }

        let browser = HttpBrowser::new(
            config.scraper.connect_timeout(),
            config.scraper.max_html_bytes,
        );
        let scraper = PageScraper::new(Arc::new(browser), config.scraper.clone());

        info!(
            base_url = %client.base_url(),
            images = config.image.enabled,
            "Pipeline handlers configured"
        );
        Ok(Self::with_pipelines(content, NicheAnalyzer::new(scraper, client)))
    }

    /// Register a handler under its own kind, replacing any previous one
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: JobKind) -> Result<Arc<dyn JobHandler>, JobError> {
        self.handlers
            .get(&kind)
            .cloned()
            .ok_or_else(|| JobError::Configuration(format!("no handler registered for {kind}")))
    }

    pub fn has_handler(&self, kind: JobKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::config::ScraperConfig;
    use crate::model::mock::ScriptedModel;
    use crate::scrape::{PageScraper, StaticLauncher};

    #[test]
    fn test_with_pipelines_registers_both_kinds() {
        let model = Arc::new(ScriptedModel::new());
        let scraper = PageScraper::new(Arc::new(StaticLauncher::new()), ScraperConfig::default());
        let registry = HandlerRegistry::with_pipelines(
            ContentGenerator::new(model.clone()),
            NicheAnalyzer::new(scraper, model),
        );

        for kind in JobKind::ALL {
            assert!(registry.has_handler(kind));
            assert_eq!(registry.get(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_missing_handler_is_configuration_error() {
        let registry = HandlerRegistry::new();
        assert!(matches!(
            registry.get(JobKind::NicheAnalysis),
            Err(JobError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = Config::default();
        match HandlerRegistry::from_config(&config) {
            Err(JobError::Configuration(msg)) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_from_config_registers_both_kinds() {
        let config = Config {
            model: ModelConfig {
                api_key: Some("sk-test".into()),
                ..ModelConfig::default()
            },
            ..Config::default()
        };
        let registry = HandlerRegistry::from_config(&config).unwrap();
        assert!(JobKind::ALL.iter().all(|k| registry.has_handler(*k)));
    }
}
