use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{TelegramConfig, TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID};
use crate::platform::{require, Platform, Publisher, UpstreamReply};
use crate::request::PublishRequest;

const SEND_FALLBACK: &str = "Telegram API returned an unsuccessful response.";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

/// Posts text messages to a single chat through the Telegram Bot API
pub struct TelegramPublisher {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramPublisher {
    pub fn new(client: reqwest::Client, config: TelegramConfig) -> Self {
        Self { client, config }
    }
}

/// Decode a `sendMessage` reply. The call succeeded only if both the HTTP
/// status and the Bot API's own `ok` flag say so.
fn decode_send_message(status: StatusCode, body: &[u8]) -> Result<UpstreamReply> {
    let reply: SendMessageResponse =
        serde_json::from_slice(body).context("Failed to parse Telegram response")?;

    if status.is_success() && reply.ok {
        Ok(UpstreamReply::Success {
            id: reply
                .result
                .as_ref()
                .and_then(|m| m.get("message_id"))
                .map(|id| id.to_string()),
        })
    } else {
        Ok(UpstreamReply::Failure {
            detail: reply.description.filter(|d| !d.trim().is_empty()),
        })
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn publish(&self, request: &PublishRequest) -> Result<String> {
        let token = require(self.config.bot_token(), TELEGRAM_BOT_TOKEN)?;
        let chat_id = require(self.config.chat_id(), TELEGRAM_CHAT_ID)?;

        // The URL embeds the bot token; keep it out of logs.
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.effective_api_base_url(),
            token
        );

        debug!("Sending Telegram message to chat {}", chat_id);

        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id,
                text: &request.message,
            })
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to send request to Telegram")?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read Telegram response")?;

        match decode_send_message(status, &body)?.into_result(SEND_FALLBACK) {
            Ok(message_id) => {
                info!(
                    "Telegram message posted (message_id: {})",
                    message_id.as_deref().unwrap_or("unknown")
                );
                Ok(format!("Message posted to {}.", Platform::Telegram.display_name()))
            }
            Err(e) => {
                warn!("Telegram rejected message ({}): {}", status, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(server: &MockServer, token: Option<&str>, chat_id: Option<&str>) -> TelegramPublisher {
        TelegramPublisher::new(
            reqwest::Client::new(),
            TelegramConfig {
                bot_token: token.map(str::to_string),
                chat_id: chat_id.map(str::to_string),
                api_base_url: server.uri(),
            },
        )
    }

    fn request(message: &str) -> PublishRequest {
        PublishRequest {
            platform: Platform::Telegram,
            message: message.to_string(),
            image_url: None,
        }
    }

    fn publish_error(err: anyhow::Error) -> PublishError {
        err.downcast::<PublishError>()
            .expect("expected a typed publish error")
    }

    #[test]
    fn test_decode_success() {
        let body = br#"{"ok":true,"result":{"message_id":77,"chat":{"id":1}}}"#;
        assert_eq!(
            decode_send_message(StatusCode::OK, body).unwrap(),
            UpstreamReply::Success {
                id: Some("77".into())
            }
        );
    }

    #[test]
    fn test_decode_ok_flag_false_on_200() {
        let body = br#"{"ok":false,"description":"Bad Request: message text is empty"}"#;
        assert_eq!(
            decode_send_message(StatusCode::OK, body).unwrap(),
            UpstreamReply::Failure {
                detail: Some("Bad Request: message text is empty".into())
            }
        );
    }

    #[test]
    fn test_decode_http_failure_without_description() {
        assert_eq!(
            decode_send_message(StatusCode::INTERNAL_SERVER_ERROR, br#"{"ok":true}"#).unwrap(),
            UpstreamReply::Failure { detail: None }
        );
    }

    #[test]
    fn test_decode_non_json_is_error() {
        assert!(decode_send_message(StatusCode::BAD_GATEWAY, b"<html>").is_err());
    }

    #[tokio::test]
    async fn test_posts_message_to_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({"chat_id": "-1001", "text": "hello"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true, "result": {"message_id": 1}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = publisher(&server, Some("123:abc"), Some("-1001"))
            .publish(&request("hello"))
            .await
            .unwrap();
        assert_eq!(result, "Message posted to Telegram.");
    }

    #[tokio::test]
    async fn test_http_failure_surfaces_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let err = publisher(&server, Some("t"), Some("c"))
            .publish(&request("hello"))
            .await
            .unwrap_err();
        assert_eq!(
            publish_error(err),
            PublishError::UpstreamRejected("Bad Request: chat not found".into())
        );
    }

    #[tokio::test]
    async fn test_failure_without_description_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
            .mount(&server)
            .await;

        let err = publisher(&server, Some("t"), Some("c"))
            .publish(&request("hello"))
            .await
            .unwrap_err();
        assert_eq!(
            publish_error(err),
            PublishError::UpstreamRejected(SEND_FALLBACK.into())
        );
    }

    #[tokio::test]
    async fn test_missing_token_makes_no_call() {
        let server = MockServer::start().await;

        let err = publisher(&server, None, Some("c"))
            .publish(&request("hello"))
            .await
            .unwrap_err();
        assert_eq!(
            publish_error(err),
            PublishError::MissingConfiguration(TELEGRAM_BOT_TOKEN)
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_chat_id_makes_no_call() {
        let server = MockServer::start().await;

        let err = publisher(&server, Some("t"), Some("  "))
            .publish(&request("hello"))
            .await
            .unwrap_err();
        assert_eq!(
            publish_error(err),
            PublishError::MissingConfiguration(TELEGRAM_CHAT_ID)
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_json_reply_is_not_a_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = publisher(&server, Some("t"), Some("c"))
            .publish(&request("hello"))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<PublishError>().is_none());
        assert!(err.to_string().contains("Telegram"));
    }
}
