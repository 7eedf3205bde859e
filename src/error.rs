//! User-facing publish failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::request::PublishResult;

/// Fallback text for failures that carry no message of their own.
pub const UNEXPECTED_FALLBACK: &str = "Unexpected error occurred.";

/// Every way a publish request can fail. The `Display` text is what the
/// caller sees in the `error` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("Invalid JSON body.")]
    MalformedInput,

    #[error("Choose either telegram or instagram.")]
    InvalidPlatform,

    #[error("Message cannot be empty.")]
    EmptyMessage,

    #[error("Instagram requires an image. Provide one in the form or set IG_DEFAULT_IMAGE_URL.")]
    MissingImage,

    #[error("Server is missing {0} env variable.")]
    MissingConfiguration(&'static str),

    #[error("{0}")]
    UpstreamRejected(String),

    #[error("{0}")]
    Unexpected(String),
}

impl PublishError {
    /// Build an `Unexpected` failure, substituting the fallback text when
    /// the underlying error has nothing to say.
    pub fn unexpected(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        if detail.trim().is_empty() {
            PublishError::Unexpected(UNEXPECTED_FALLBACK.to_string())
        } else {
            PublishError::Unexpected(detail)
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PublishError::MalformedInput
            | PublishError::InvalidPlatform
            | PublishError::EmptyMessage
            | PublishError::MissingImage => StatusCode::BAD_REQUEST,
            PublishError::MissingConfiguration(_) | PublishError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PublishError::UpstreamRejected(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for PublishError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(PublishResult::failure(self.to_string()))).into_response()
    }
}
