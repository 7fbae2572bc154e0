//! Request checks shared by the JSON endpoints

use axum::http::{HeaderMap, header};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;

/// Parses and validates Content-Type header for application/json
///
/// Accepts `application/json`, optionally with a charset parameter. Rejects
/// `application/jsonp`, `application/json-patch+json`, `text/json` and
/// other media types. A value that is not a media type at all is a bad
/// request rather than an unsupported type.
pub fn parse_content_type(content_type: &str) -> Result<mime::Mime, ApiError> {
    let media_type: mime::Mime = content_type.parse().map_err(|_| {
        ApiError::InvalidPayload(format!("invalid Content-Type: {}", content_type))
    })?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::UnsupportedMediaType(format!(
            "Content-Type must be application/json, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(media_type)
}

/// Validates that body size does not exceed the maximum allowed size
pub fn validate_body_size(data: &[u8], max_size: usize) -> Result<(), ApiError> {
    if data.len() > max_size {
        return Err(ApiError::PayloadTooLarge(data.len()));
    }
    Ok(())
}

/// Content-type check, size check, then deserialize.
///
/// Bodies arrive already decompressed by `RequestDecompressionLayer`.
pub fn json_body<T: DeserializeOwned>(
    headers: &HeaderMap,
    body: &[u8],
    max_size: usize,
) -> Result<T, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;
    parse_content_type(content_type)?;
    validate_body_size(body, max_size)?;

    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_content_type_valid() {
        assert!(parse_content_type("application/json").is_ok());
        assert!(parse_content_type("application/json; charset=utf-8").is_ok());
        assert!(parse_content_type("application/json; charset=UTF-8").is_ok());
    }

    #[test]
    fn test_parse_content_type_invalid() {
        for value in ["application/jsonp", "application/json-patch+json", "text/json", "text/plain"] {
            assert!(matches!(
                parse_content_type(value),
                Err(ApiError::UnsupportedMediaType(_))
            ));
        }
        assert!(matches!(parse_content_type("invalid"), Err(ApiError::InvalidPayload(_))));
        assert!(matches!(parse_content_type(""), Err(ApiError::InvalidPayload(_))));
    }

    #[test]
    fn test_validate_body_size_ok() {
        let data = vec![0u8; 1000];
        assert!(validate_body_size(&data, 1000).is_ok());
        assert!(validate_body_size(&data, 2000).is_ok());
        assert!(validate_body_size(&[], 100).is_ok());
    }

    #[test]
    fn test_validate_body_size_too_large() {
        let data = vec![0u8; 1000];
        let result = validate_body_size(&data, 999);
        match result {
            Err(ApiError::PayloadTooLarge(size)) => assert_eq!(size, 1000),
            _ => panic!("Expected PayloadTooLarge error"),
        }
    }

    #[test]
    fn test_json_body_requires_content_type() {
        let headers = HeaderMap::new();
        let result = json_body::<serde_json::Value>(&headers, b"{}", 100);
        assert!(matches!(result, Err(ApiError::InvalidPayload(_))));
    }

    #[test]
    fn test_json_body_parses() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let value: serde_json::Value = json_body(&headers, br#"{"a": 1}"#, 100).unwrap();
        assert_eq!(value["a"], 1);

        let malformed = json_body::<serde_json::Value>(&headers, b"{", 100);
        assert!(matches!(malformed, Err(ApiError::InvalidPayload(_))));
    }
}
