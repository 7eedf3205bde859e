pub mod instagram;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::PublishError;
use crate::request::PublishRequest;

/// Supported publishing targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Telegram,
    Instagram,
}

impl Platform {
    /// Parse the value sent by the form. Matching is exact.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "telegram" => Some(Platform::Telegram),
            "instagram" => Some(Platform::Instagram),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Telegram => "Telegram",
            Platform::Instagram => "Instagram",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Telegram => write!(f, "telegram"),
            Platform::Instagram => write!(f, "instagram"),
        }
    }
}

/// A platform-specific publisher.
///
/// Known failures are returned as a [`PublishError`] inside the `anyhow`
/// error; anything else (transport, decoding) is left for the dispatcher
/// to classify as unexpected.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn platform(&self) -> Platform;

    /// Publish the request and return the success description.
    async fn publish(&self, request: &PublishRequest) -> Result<String>;
}

/// Decoded upstream response, independent of the provider's error shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamReply {
    Success { id: Option<String> },
    Failure { detail: Option<String> },
}

impl UpstreamReply {
    /// Turn the reply into a result, using `fallback` when the provider
    /// gave no explanation for the failure.
    pub fn into_result(self, fallback: &str) -> std::result::Result<Option<String>, PublishError> {
        match self {
            UpstreamReply::Success { id } => Ok(id),
            UpstreamReply::Failure { detail: Some(detail) } => {
                Err(PublishError::UpstreamRejected(detail))
            }
            UpstreamReply::Failure { detail: None } => {
                Err(PublishError::UpstreamRejected(fallback.to_string()))
            }
        }
    }
}

/// Return the credential, or fail naming the setting that is missing.
pub(crate) fn require<'a>(
    value: Option<&'a str>,
    name: &'static str,
) -> std::result::Result<&'a str, PublishError> {
    value.ok_or(PublishError::MissingConfiguration(name))
}
