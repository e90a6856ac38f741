//! Content-type gated JSON decoding.

use serde::de::DeserializeOwned;

use crate::error::{DecodeError, OutcomeError};

/// Whether `content_type` names JSON: `application/json` or any
/// `application/*+json` type. Parameters such as `charset` are ignored.
pub fn is_json_content_type(content_type: &str) -> bool {
    let Ok(media) = content_type.trim().parse::<mime::Mime>() else {
        return false;
    };
    media.type_() == mime::APPLICATION
        && (media.subtype() == mime::JSON || media.suffix().is_some_and(|s| s == mime::JSON))
}

/// Deserialize `body` into `T`.
///
/// The body is never parsed unless the content type is JSON.
pub fn decode<T: DeserializeOwned>(body: &[u8], content_type: Option<&str>) -> Result<T, OutcomeError> {
    match content_type {
        Some(ct) if is_json_content_type(ct) => {}
        _ => return Err(OutcomeError::UnsupportedContentType),
    }
    serde_json::from_slice(body).map_err(|e| OutcomeError::DecodingFailed(DecodeError::from(e)))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::error::Category;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Keyed {
        key: String,
    }

    #[test]
    fn json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("Application/JSON"));
        assert!(is_json_content_type("application/problem+json"));
    }

    #[test]
    fn non_json_content_types() {
        assert!(!is_json_content_type("application/xml"));
        assert!(!is_json_content_type("text/json-ish"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type(""));
        assert!(!is_json_content_type("not a media type"));
    }

    #[test]
    fn decodes_matching_body() {
        let value: Keyed = decode(br#"{"key":"value"}"#, Some("application/json")).unwrap();
        assert_eq!(value.key, "value");
    }

    #[test]
    fn xml_is_rejected_before_parsing() {
        // A body that would parse fine as JSON is still refused.
        let err = decode::<Keyed>(br#"{"key":"value"}"#, Some("application/xml")).unwrap_err();
        assert_eq!(err, OutcomeError::UnsupportedContentType);
    }

    #[test]
    fn missing_content_type_is_rejected() {
        let err = decode::<Keyed>(br#"{"key":"value"}"#, None).unwrap_err();
        assert_eq!(err, OutcomeError::UnsupportedContentType);
    }

    #[test]
    fn malformed_body_is_decoding_failed() {
        let err = decode::<Keyed>(br#"{"key";"value"}"#, Some("application/json")).unwrap_err();
        match err {
            OutcomeError::DecodingFailed(cause) => assert_eq!(cause.category(), Category::Syntax),
            other => panic!("expected DecodingFailed, got {other:?}"),
        }
    }

    #[test]
    fn schema_mismatch_is_data_error() {
        let err = decode::<Keyed>(br#"{"other":1}"#, Some("application/json")).unwrap_err();
        match err {
            OutcomeError::DecodingFailed(cause) => assert_eq!(cause.category(), Category::Data),
            other => panic!("expected DecodingFailed, got {other:?}"),
        }
    }
}
