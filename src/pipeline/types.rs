//! Request and result types flowing through the generation pipelines.

use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::platform::Platform;

/// Voice the generated copy should be written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Friendly,
    Humorous,
    Inspirational,
    Educational,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::Professional,
        Tone::Casual,
        Tone::Friendly,
        Tone::Humorous,
        Tone::Inspirational,
        Tone::Educational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Friendly => "friendly",
            Tone::Humorous => "humorous",
            Tone::Inspirational => "inspirational",
            Tone::Educational => "educational",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tone '{s}'"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandVoice {
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub writing_style: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAudience {
    #[serde(default)]
    pub demographics: String,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Niche profile fields used to personalise a generation prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicheContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_voice: Option<BrandVoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<TargetAudience>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl From<&NicheAnalysisResult> for NicheContext {
    fn from(result: &NicheAnalysisResult) -> Self {
        Self {
            industry: Some(result.industry.clone()),
            brand_voice: Some(result.brand_voice.clone()),
            target_audience: Some(result.target_audience.clone()),
            keywords: result.keywords.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct ContentGenerationRequest {
    #[builder(into)]
    pub topic: String,
    pub platform: Platform,
    #[serde(default)]
    #[builder(default)]
    pub tone: Tone,
    #[serde(default)]
    #[builder(default)]
    pub include_image: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub image_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche_context: Option<NicheContext>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub body: String,
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
    pub platform: Platform,
    pub character_count: usize,
    /// Non-fatal platform limit breaches noticed during generation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicheAnalysisRequest {
    pub website_url: String,
    /// Reserved for multi-page expansion; single-page analysis ignores it
    #[serde(default)]
    pub deep_scrape: bool,
}

impl NicheAnalysisRequest {
    pub fn new(website_url: impl Into<String>) -> Self {
        Self {
            website_url: website_url.into(),
            deep_scrape: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStrategy {
    #[serde(default)]
    pub topics: Vec<String>,
    /// Posts per week
    #[serde(default, deserialize_with = "lenient_u32")]
    pub frequency: u32,
    #[serde(default)]
    pub best_times: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutopilotConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub content_types: Vec<String>,
    #[serde(default)]
    pub schedule: String,
}

/// Niche profile as returned by the model.
///
/// Every field defaults so that partially filled replies can still be
/// inspected; `validation::validate_analysis` decides whether it is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicheAnalysisResult {
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub brand_voice: BrandVoice,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub content_strategy: ContentStrategy,
    #[serde(default)]
    pub autopilot_config: AutopilotConfig,
}

/// Accepts `3`, `3.0`, `"3"` or `"3 posts per week"`
fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        serde_json::Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().ok()
        }
        serde_json::Value::Null => Some(0),
        _ => None,
    };

    parsed
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("expected a weekly post count, got {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_parses_case_insensitively() {
        assert_eq!("Casual".parse::<Tone>().unwrap(), Tone::Casual);
        assert_eq!(" humorous ".parse::<Tone>().unwrap(), Tone::Humorous);
        assert!("sarcastic".parse::<Tone>().is_err());
    }

    #[test]
    fn test_request_builder_defaults() {
        let request = ContentGenerationRequest::builder()
            .topic("Spring sale")
            .platform(Platform::Instagram)
            .build();

        assert_eq!(request.tone, Tone::Professional);
        assert!(!request.include_image);
        assert!(request.image_style.is_none());
        assert!(request.niche_context.is_none());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: ContentGenerationRequest =
            serde_json::from_str(r#"{"topic": "Launch day", "platform": "linkedin"}"#).unwrap();
        assert_eq!(request.platform, Platform::Linkedin);
        assert_eq!(request.tone, Tone::Professional);
    }

    #[test]
    fn test_frequency_accepts_loose_values() {
        let strategy: ContentStrategy =
            serde_json::from_str(r#"{"frequency": "4 posts per week"}"#).unwrap();
        assert_eq!(strategy.frequency, 4);

        let strategy: ContentStrategy = serde_json::from_str(r#"{"frequency": 3}"#).unwrap();
        assert_eq!(strategy.frequency, 3);

        assert!(serde_json::from_str::<ContentStrategy>(r#"{"frequency": "often"}"#).is_err());
    }

    #[test]
    fn test_partial_analysis_deserializes() {
        let result: NicheAnalysisResult =
            serde_json::from_str(r#"{"industry": "Bakery"}"#).unwrap();
        assert_eq!(result.industry, "Bakery");
        assert!(result.keywords.is_empty());
        assert!(!result.autopilot_config.enabled);
    }
}
