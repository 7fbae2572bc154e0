//! Niche analysis: scrape a site, mine its structure, ask the model for a profile.

use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::types::{AutopilotConfig, NicheAnalysisRequest, NicheAnalysisResult};
use crate::extractor::{self, StructuredContent};
use crate::model::{InvokeOptions, LanguageModel, Message, ModelError};
use crate::parser::{ParseError, parse_model_json};
use crate::scrape::{PageScraper, ScrapeError, ScrapedSite};
use crate::validation::validate_analysis;

const PROMPT_TEXT_CHARS: usize = 10_000;
const PROMPT_HEADINGS: usize = 10;
const PROMPT_SERVICES: usize = 5;

const SYSTEM_PROMPT: &str = "You are a marketing strategist who profiles small businesses \
from their websites. You always answer with a single JSON object and nothing else.";

const RESULT_SHAPE: &str = r#"{
  "industry": "string",
  "brand_voice": {"tone": "string", "keywords": ["string"], "writing_style": "string"},
  "target_audience": {"demographics": "string", "pain_points": ["string"], "interests": ["string"]},
  "competitors": ["string"],
  "keywords": ["string"],
  "content_strategy": {"topics": ["string"], "frequency": 3, "best_times": ["string"], "platforms": ["string"]},
  "autopilot_config": {"enabled": false, "content_types": ["string"], "schedule": "string"}
}"#;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error("model returned an empty analysis")]
    EmptyResponse,

    #[error("could not parse analysis: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Clone)]
pub struct NicheAnalyzer {
    scraper: PageScraper,
    model: Arc<dyn LanguageModel>,
}

impl NicheAnalyzer {
    pub fn new(scraper: PageScraper, model: Arc<dyn LanguageModel>) -> Self {
        Self { scraper, model }
    }

    pub async fn analyze(
        &self,
        request: &NicheAnalysisRequest,
    ) -> Result<NicheAnalysisResult, AnalysisError> {
        if request.deep_scrape {
            info!(url = %request.website_url, "Deep scrape requested, analysing landing page only");
        }

        let site = self.scraper.scrape(&request.website_url).await?;
        let structure = extractor::extract(&site.html);

        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(build_prompt(&site, &structure)),
        ];
        let reply = self.model.invoke(&messages, InvokeOptions::json()).await?;

        if reply.text.trim().is_empty() {
            warn!(url = %site.url, "Model returned empty analysis");
            return Err(AnalysisError::EmptyResponse);
        }

        let result: NicheAnalysisResult = parse_model_json(&reply.text)?;
        info!(url = %site.url, industry = %result.industry, "Niche analysed");

        Ok(result)
    }
}

fn build_prompt(site: &ScrapedSite, structure: &StructuredContent) -> String {
    let mut prompt = format!(
        "Analyse this business website and build its niche profile.\n\nURL: {}\nTitle: {}\n",
        site.url, site.title
    );

    if let Some(description) = site.meta_description() {
        let _ = writeln!(prompt, "Meta description: {description}");
    }

    if !structure.headings.is_empty() {
        prompt.push_str("\nHeadings:\n");
        for heading in structure.headings.iter().take(PROMPT_HEADINGS) {
            let _ = writeln!(prompt, "- {heading}");
        }
    }

    if !structure.services.is_empty() {
        prompt.push_str("\nServices:\n");
        for service in structure.services.iter().take(PROMPT_SERVICES) {
            let _ = writeln!(prompt, "- {service}");
        }
    }

    let sample: String = site.text.chars().take(PROMPT_TEXT_CHARS).collect();
    let _ = write!(
        prompt,
        "\nPage text:\n{sample}\n\n\
         Respond with only a JSON object with exactly these fields:\n{RESULT_SHAPE}\n\n\
         Every array must contain at least 3 items. \
         frequency is the number of posts per week."
    );

    prompt
}

const AUTOPILOT_CONTENT_TYPES: usize = 3;

/// Derive an autopilot configuration from an analysis' content strategy.
///
/// Autopilot is only enabled for profiles that pass validation.
pub fn derive_autopilot(result: &NicheAnalysisResult) -> AutopilotConfig {
    let strategy = &result.content_strategy;

    let content_types = strategy
        .topics
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .take(AUTOPILOT_CONTENT_TYPES)
        .map(str::to_string)
        .collect();

    let mut schedule = match strategy.frequency {
        0 => "No regular posting".to_string(),
        1 => "1 post per week".to_string(),
        n => format!("{n} posts per week"),
    };
    if !strategy.best_times.is_empty() {
        let _ = write!(schedule, " at {}", strategy.best_times.join(", "));
    }
    if !strategy.platforms.is_empty() {
        let _ = write!(schedule, " on {}", strategy.platforms.join(", "));
    }

    AutopilotConfig {
        enabled: strategy.frequency > 0 && validate_analysis(result).is_valid,
        content_types,
        schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::model::mock::ScriptedModel;
    use crate::pipeline::{BrandVoice, ContentStrategy, TargetAudience};
    use crate::scrape::StaticLauncher;

    const SITE: &str = "https://bakery.example/";

    const HTML: &str = r#"<html>
<head>
  <title>Crumb &amp; Co</title>
  <meta name="description" content="Neighbourhood sourdough bakery">
</head>
<body>
  <h1>Baked fresh every morning</h1>
  <h2>Our loaves</h2>
  <p>We have been baking naturally leavened bread in the old town since 2009, every single day.</p>
  <div class="service-card">Custom celebration cakes made to order</div>
  <script>window.tracking = true;</script>
</body>
</html>"#;

    const ANALYSIS: &str = r#"{
        "industry": "Artisan bakery",
        "brand_voice": {"tone": "warm", "keywords": ["sourdough", "local", "handmade"], "writing_style": "friendly"},
        "target_audience": {"demographics": "Local families", "pain_points": ["time"], "interests": ["food"]},
        "competitors": ["Big Bread"],
        "keywords": ["bread"],
        "content_strategy": {"topics": ["baking tips", "new loaves", "behind the scenes", "events"], "frequency": 4, "best_times": ["08:00"], "platforms": ["instagram", "facebook"]},
        "autopilot_config": {"enabled": true, "content_types": ["tips"], "schedule": "daily"}
    }"#;

    fn analyzer(launcher: StaticLauncher, model: Arc<ScriptedModel>) -> NicheAnalyzer {
        let scraper = PageScraper::new(Arc::new(launcher), ScraperConfig::default());
        NicheAnalyzer::new(scraper, model)
    }

    #[tokio::test]
    async fn test_analyze_builds_prompt_from_page() {
        let launcher = StaticLauncher::new().with_page(SITE, HTML);
        let model = Arc::new(ScriptedModel::replying(ANALYSIS));

        let result = analyzer(launcher.clone(), model.clone())
            .analyze(&NicheAnalysisRequest::new(SITE))
            .await
            .unwrap();

        assert_eq!(result.industry, "Artisan bakery");
        assert_eq!(result.content_strategy.frequency, 4);
        assert!(result.autopilot_config.enabled);

        let prompt = &model.prompts()[0];
        assert!(prompt.contains("URL: https://bakery.example/"));
        assert!(prompt.contains("Title: Crumb & Co"));
        assert!(prompt.contains("Meta description: Neighbourhood sourdough bakery"));
        assert!(prompt.contains("- Baked fresh every morning"));
        assert!(prompt.contains("- Custom celebration cakes made to order"));
        assert!(prompt.contains("at least 3 items"));
        assert!(!prompt.contains("window.tracking"));
        assert_eq!(launcher.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_scrape_failure_propagates_without_model_call() {
        let launcher = StaticLauncher::new();
        let model = Arc::new(ScriptedModel::replying(ANALYSIS));

        let err = analyzer(launcher.clone(), model.clone())
            .analyze(&NicheAnalysisRequest::new("https://unreachable.example"))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Scrape(ScrapeError::Navigation { .. })));
        assert_eq!(model.call_count(), 0);
        assert_eq!(launcher.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_invalid_url_short_circuits() {
        let launcher = StaticLauncher::new();
        let model = Arc::new(ScriptedModel::replying(ANALYSIS));

        let err = analyzer(launcher.clone(), model)
            .analyze(&NicheAnalysisRequest::new("not a url"))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Scrape(ScrapeError::InvalidUrl { .. })));
        assert_eq!(launcher.launches(), 0);
    }

    #[tokio::test]
    async fn test_empty_and_garbage_replies() {
        let launcher = StaticLauncher::new().with_page(SITE, HTML);

        let empty = analyzer(launcher.clone(), Arc::new(ScriptedModel::replying("")))
            .analyze(&NicheAnalysisRequest::new(SITE))
            .await
            .unwrap_err();
        assert!(matches!(empty, AnalysisError::EmptyResponse));

        let garbage = analyzer(launcher, Arc::new(ScriptedModel::replying("no idea")))
            .analyze(&NicheAnalysisRequest::new(SITE))
            .await
            .unwrap_err();
        assert!(matches!(garbage, AnalysisError::Parse(_)));
    }

    #[tokio::test]
    async fn test_partial_result_returned_unvalidated() {
        let launcher = StaticLauncher::new().with_page(SITE, HTML);
        let model = Arc::new(ScriptedModel::replying(r#"{"industry": "ab"}"#));

        let result = analyzer(launcher, model)
            .analyze(&NicheAnalysisRequest::new(SITE))
            .await
            .unwrap();

        assert_eq!(result.industry, "ab");
        assert!(!validate_analysis(&result).is_valid);
    }

    fn strategy_result(frequency: u32) -> NicheAnalysisResult {
        NicheAnalysisResult {
            industry: "Artisan bakery".into(),
            brand_voice: BrandVoice {
                tone: "warm".into(),
                keywords: vec!["a".into(), "b".into(), "c".into()],
                writing_style: String::new(),
            },
            target_audience: TargetAudience {
                demographics: "Local families".into(),
                ..Default::default()
            },
            content_strategy: ContentStrategy {
                topics: vec!["tips".into(), " ".into(), "loaves".into(), "team".into(), "events".into()],
                frequency,
                best_times: vec!["08:00".into(), "17:30".into()],
                platforms: vec!["instagram".into()],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_derive_autopilot_from_strategy() {
        let autopilot = derive_autopilot(&strategy_result(3));

        assert!(autopilot.enabled);
        assert_eq!(autopilot.content_types, vec!["tips", "loaves", "team"]);
        assert_eq!(autopilot.schedule, "3 posts per week at 08:00, 17:30 on instagram");
    }

    #[test]
    fn test_derive_autopilot_disabled_for_invalid_or_idle_profiles() {
        assert!(!derive_autopilot(&strategy_result(0)).enabled);

        let mut invalid = strategy_result(3);
        invalid.industry = "ab".into();
        assert!(!derive_autopilot(&invalid).enabled);
    }
}
