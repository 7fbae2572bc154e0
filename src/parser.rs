//! Recovers typed JSON objects from model replies.
//!
//! Models asked for JSON sometimes wrap it in prose or code fences. Parsing
//! makes exactly two attempts: the raw text, then the greedy span from the
//! first `{` to the last `}`. Anything else is a [`ParseError`].

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model reply contains no JSON object")]
    NoJsonObject,

    #[error("model reply JSON is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let trimmed = raw.trim();

    let first_error = match serde_json::from_str::<T>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let span = object_span(trimmed).ok_or_else(|| {
        debug!(error = %first_error, "Reply is not JSON and has no object span");
        ParseError::NoJsonObject
    })?;

    debug!(
        offset = span.as_ptr() as usize - trimmed.as_ptr() as usize,
        len = span.len(),
        "Retrying parse on embedded object span"
    );

    Ok(serde_json::from_str(span)?)
}

/// Greedy `{ ... }` span: first opening brace through last closing brace
fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Post {
        body: String,
        hashtags: Vec<String>,
    }

    const PURE: &str = r##"{"body": "Fresh bread daily", "hashtags": ["#bakery"]}"##;

    #[test]
    fn test_pure_and_wrapped_json_parse_identically() {
        let wrapped = format!("Sure! Here is your post:\n```json\n{PURE}\n```\nEnjoy.");

        let direct: Post = parse_model_json(PURE).unwrap();
        let recovered: Post = parse_model_json(&wrapped).unwrap();
        assert_eq!(direct, recovered);
    }

    #[test]
    fn test_nested_objects_survive_greedy_span() {
        let wrapped = r#"Result: {"outer": {"inner": 1}} done"#;
        let value: serde_json::Value = parse_model_json(wrapped).unwrap();
        assert_eq!(value["outer"]["inner"], 1);
    }

    #[test]
    fn test_no_braces_is_no_json_object() {
        let err = parse_model_json::<Post>("I cannot help with that.").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObject));
    }

    #[test]
    fn test_broken_span_is_malformed() {
        let err = parse_model_json::<Post>("here { body: nope } there").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_reversed_braces_have_no_span() {
        assert!(object_span("} text {").is_none());
    }
}
