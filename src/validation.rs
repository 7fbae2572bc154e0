//! Quality checks over pipeline outputs.
//!
//! Validation never fails and never modifies its input: every violation is
//! reported as a human-readable issue.

use serde::{Deserialize, Serialize};

use crate::pipeline::{GeneratedContent, NicheAnalysisResult};
use crate::platform::PlatformSpec;

const MIN_INDUSTRY_CHARS: usize = 3;
const MIN_BRAND_KEYWORDS: usize = 3;
const MIN_STRATEGY_TOPICS: usize = 3;
const MIN_PLATFORMS: usize = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<String>) -> Self {
        Self {
            is_valid: issues.is_empty(),
            issues,
        }
    }
}

pub fn validate_analysis(result: &NicheAnalysisResult) -> ValidationReport {
    let mut issues = Vec::new();

    if result.industry.trim().chars().count() < MIN_INDUSTRY_CHARS {
        issues.push(format!(
            "Industry must be at least {MIN_INDUSTRY_CHARS} characters"
        ));
    }
    if result.brand_voice.tone.trim().is_empty() {
        issues.push("Brand voice tone is missing".to_string());
    }
    if result.brand_voice.keywords.len() < MIN_BRAND_KEYWORDS {
        issues.push(format!(
            "Brand voice needs at least {MIN_BRAND_KEYWORDS} keywords (found {})",
            result.brand_voice.keywords.len()
        ));
    }
    if result.target_audience.demographics.trim().is_empty() {
        issues.push("Target audience demographics are missing".to_string());
    }
    if result.content_strategy.topics.len() < MIN_STRATEGY_TOPICS {
        issues.push(format!(
            "Content strategy needs at least {MIN_STRATEGY_TOPICS} topics (found {})",
            result.content_strategy.topics.len()
        ));
    }
    if result.content_strategy.platforms.len() < MIN_PLATFORMS {
        issues.push("Content strategy must name at least one platform".to_string());
    }

    ValidationReport::from_issues(issues)
}

pub fn validate_content(content: &GeneratedContent) -> ValidationReport {
    validate_content_for(
        content.platform.as_str(),
        &content.body,
        &content.hashtags,
        content.character_count,
    )
}

/// Validate a post against a raw platform key.
///
/// An unknown key is reported as an issue alongside any other findings.
pub fn validate_content_for(
    platform: &str,
    body: &str,
    hashtags: &[String],
    character_count: usize,
) -> ValidationReport {
    let mut issues = Vec::new();

    if body.trim().is_empty() {
        issues.push("Content body is empty".to_string());
    }

    match PlatformSpec::for_key(platform) {
        Ok(spec) => {
            if character_count > spec.max_length {
                issues.push(format!(
                    "Content exceeds {} maximum length ({}/{})",
                    spec.platform, character_count, spec.max_length
                ));
            }
            if hashtags.len() > spec.hashtag_limit {
                issues.push(format!(
                    "Too many hashtags for {} ({}/{})",
                    spec.platform,
                    hashtags.len(),
                    spec.hashtag_limit
                ));
            }
        }
        Err(_) => issues.push(format!("Unknown platform: {platform}")),
    }

    ValidationReport::from_issues(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{BrandVoice, ContentStrategy, TargetAudience};
    use crate::platform::Platform;

    fn content(platform: Platform, body: String, hashtags: Vec<String>) -> GeneratedContent {
        let character_count = body.chars().count();
        GeneratedContent {
            body,
            hashtags,
            image_url: None,
            image_prompt: None,
            platform,
            character_count,
            warnings: vec![],
        }
    }

    fn complete_analysis() -> NicheAnalysisResult {
        NicheAnalysisResult {
            industry: "Artisan bakery".into(),
            brand_voice: BrandVoice {
                tone: "warm".into(),
                keywords: vec!["sourdough".into(), "local".into(), "handmade".into()],
                writing_style: "conversational".into(),
            },
            target_audience: TargetAudience {
                demographics: "Urban professionals 25-45".into(),
                pain_points: vec!["no time to bake".into()],
                interests: vec!["food".into()],
            },
            competitors: vec![],
            keywords: vec!["bread".into()],
            content_strategy: ContentStrategy {
                topics: vec!["baking tips".into(), "new loaves".into(), "team".into()],
                frequency: 3,
                best_times: vec!["08:00".into()],
                platforms: vec!["instagram".into()],
            },
            autopilot_config: Default::default(),
        }
    }

    #[test]
    fn test_overlong_tweet_is_invalid() {
        let report = validate_content(&content(Platform::Twitter, "A".repeat(300), vec![]));

        assert!(!report.is_valid);
        assert!(
            report
                .issues
                .iter()
                .any(|i| i.contains("maximum length") && i.contains("300/280"))
        );
    }

    #[test]
    fn test_limits_hold_for_every_platform() {
        for platform in Platform::ALL {
            let spec = platform.spec();
            let hashtags: Vec<String> = (0..spec.hashtag_limit).map(|i| format!("#t{i}")).collect();

            let at_limit = validate_content(&content(platform, "x".repeat(spec.max_length), hashtags.clone()));
            assert!(at_limit.is_valid, "{platform}: {:?}", at_limit.issues);

            let over = validate_content(&content(platform, "x".repeat(spec.max_length + 1), hashtags.clone()));
            assert!(!over.is_valid, "{platform} accepted an overlong body");

            let mut too_many = hashtags;
            too_many.push("#extra".into());
            let tagged = validate_content(&content(platform, "ok".into(), too_many));
            assert!(!tagged.is_valid, "{platform} accepted too many hashtags");
        }
    }

    #[test]
    fn test_empty_body_is_an_issue() {
        let report = validate_content(&content(Platform::Linkedin, "   ".into(), vec![]));
        assert_eq!(report.issues, vec!["Content body is empty".to_string()]);
    }

    #[test]
    fn test_unknown_platform_key_is_an_issue() {
        let report = validate_content_for("myspace", "hello", &[], 5);
        assert!(!report.is_valid);
        assert_eq!(report.issues, vec!["Unknown platform: myspace".to_string()]);
    }

    #[test]
    fn test_complete_analysis_is_valid() {
        let report = validate_analysis(&complete_analysis());
        assert!(report.is_valid, "{:?}", report.issues);
    }

    #[test]
    fn test_short_industry_reported() {
        let mut analysis = complete_analysis();
        analysis.industry = "ab".into();

        let report = validate_analysis(&analysis);
        assert!(!report.is_valid);
        assert!(report.issues.iter().any(|i| i.contains("Industry")));
    }

    #[test]
    fn test_empty_analysis_reports_every_rule() {
        let report = validate_analysis(&NicheAnalysisResult::default());
        assert_eq!(report.issues.len(), 6);
    }

    #[test]
    fn test_validation_does_not_modify_input() {
        let analysis = complete_analysis();
        let before = analysis.clone();
        let _ = validate_analysis(&analysis);
        assert_eq!(analysis, before);
    }
}
