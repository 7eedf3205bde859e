use serde::{Deserialize, Serialize};

use crate::error::PublishError;
use crate::platform::Platform;

/// A validated publish request. Lives for the duration of one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub platform: Platform,
    /// Trimmed, never empty
    pub message: String,
    /// Trimmed; `None` when absent or blank
    pub image_url: Option<String>,
}

/// The body exactly as the form sends it. Every field is optional so that
/// semantic checks can report their own errors.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPublishRequest {
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl PublishRequest {
    /// Parse and validate a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, PublishError> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|_| PublishError::MalformedInput)?;
        // serde would happily read a struct out of a JSON array
        if !value.is_object() {
            return Err(PublishError::MalformedInput);
        }
        let raw: RawPublishRequest =
            serde_json::from_value(value).map_err(|_| PublishError::MalformedInput)?;

        let platform = raw
            .platform
            .as_deref()
            .and_then(Platform::from_wire)
            .ok_or(PublishError::InvalidPlatform)?;

        let message = raw
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(PublishError::EmptyMessage)?
            .to_string();

        let image_url = raw
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Ok(Self {
            platform,
            message,
            image_url,
        })
    }
}

/// The uniform response body for every outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublishResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<PublishRequest, PublishError> {
        PublishRequest::parse(body.as_bytes())
    }

    #[test]
    fn test_valid_telegram_request() {
        let req = parse(r#"{"platform":"telegram","message":"  hello world \n"}"#).unwrap();
        assert_eq!(req.platform, Platform::Telegram);
        assert_eq!(req.message, "hello world");
        assert_eq!(req.image_url, None);
    }

    #[test]
    fn test_image_url_is_trimmed() {
        let req = parse(
            r#"{"platform":"instagram","message":"hi","imageUrl":"  https://x.test/a.jpg  "}"#,
        )
        .unwrap();
        assert_eq!(req.platform, Platform::Instagram);
        assert_eq!(req.image_url.as_deref(), Some("https://x.test/a.jpg"));
    }

    #[test]
    fn test_blank_image_url_is_absent() {
        let req = parse(r#"{"platform":"instagram","message":"hi","imageUrl":"   "}"#).unwrap();
        assert_eq!(req.image_url, None);
    }

    #[test]
    fn test_malformed_json() {
        assert_eq!(parse("{not json"), Err(PublishError::MalformedInput));
        assert_eq!(parse(""), Err(PublishError::MalformedInput));
    }

    #[test]
    fn test_non_object_body_is_malformed() {
        assert_eq!(parse(r#""telegram""#), Err(PublishError::MalformedInput));
        assert_eq!(parse(r#"["telegram","hi"]"#), Err(PublishError::MalformedInput));
        assert_eq!(parse("null"), Err(PublishError::MalformedInput));
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        assert_eq!(
            parse(r#"{"platform":"telegram","message":42}"#),
            Err(PublishError::MalformedInput)
        );
    }

    #[test]
    fn test_missing_or_unknown_platform() {
        assert_eq!(parse(r#"{"message":"hi"}"#), Err(PublishError::InvalidPlatform));
        assert_eq!(
            parse(r#"{"platform":"telegarm","message":"hi"}"#),
            Err(PublishError::InvalidPlatform)
        );
        assert_eq!(
            parse(r#"{"platform":"Telegram","message":"hi"}"#),
            Err(PublishError::InvalidPlatform)
        );
        assert_eq!(
            parse(r#"{"platform":"","message":"hi"}"#),
            Err(PublishError::InvalidPlatform)
        );
    }

    #[test]
    fn test_platform_checked_before_message() {
        assert_eq!(parse(r#"{"message":""}"#), Err(PublishError::InvalidPlatform));
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(
            parse(r#"{"platform":"telegram","message":"   \t\n"}"#),
            Err(PublishError::EmptyMessage)
        );
        assert_eq!(
            parse(r#"{"platform":"instagram"}"#),
            Err(PublishError::EmptyMessage)
        );
    }

    #[test]
    fn test_result_omits_absent_fields() {
        let ok = serde_json::to_value(PublishResult::success("done")).unwrap();
        assert_eq!(ok, serde_json::json!({"ok": true, "message": "done"}));

        let err = serde_json::to_value(PublishResult::failure("nope")).unwrap();
        assert_eq!(err, serde_json::json!({"ok": false, "error": "nope"}));
    }
}
