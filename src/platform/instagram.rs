//! Instagram publishing through the Graph API content-publishing flow.
//!
//! Publishing is two ordered calls: create a media container from the image
//! and caption, then publish that container. The first failure stops the
//! flow. A container created by a flow whose publish step fails is left for
//! the provider to expire.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{InstagramConfig, IG_ACCESS_TOKEN, IG_BUSINESS_ID};
use crate::error::PublishError;
use crate::platform::{require, Platform, Publisher, UpstreamReply};
use crate::request::PublishRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphStep {
    CreateContainer,
    PublishContainer,
}

impl GraphStep {
    fn edge(&self) -> &'static str {
        match self {
            GraphStep::CreateContainer => "media",
            GraphStep::PublishContainer => "media_publish",
        }
    }

    fn fallback(&self) -> &'static str {
        match self {
            GraphStep::CreateContainer => {
                "Instagram Graph API could not create the media container."
            }
            GraphStep::PublishContainer => "Instagram Graph API could not publish the media.",
        }
    }
}

impl std::fmt::Display for GraphStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphStep::CreateContainer => write!(f, "create container"),
            GraphStep::PublishContainer => write!(f, "publish container"),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateContainerRequest<'a> {
    caption: &'a str,
    image_url: &'a str,
    access_token: &'a str,
}

#[derive(Debug, Serialize)]
struct PublishContainerRequest<'a> {
    creation_id: &'a str,
    access_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphResponse {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    #[serde(default)]
    message: Option<String>,
}

/// Graph ids are strings, but accept numbers too.
fn graph_id(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a Graph API reply. Success needs a 2xx status and an `id`.
fn decode_graph(status: StatusCode, body: &[u8]) -> Result<UpstreamReply> {
    let reply: GraphResponse =
        serde_json::from_slice(body).context("Failed to parse Instagram Graph API response")?;

    match graph_id(reply.id) {
        Some(id) if status.is_success() => Ok(UpstreamReply::Success { id: Some(id) }),
        _ => Ok(UpstreamReply::Failure {
            detail: reply
                .error
                .and_then(|e| e.message)
                .filter(|m| !m.trim().is_empty()),
        }),
    }
}

/// Publishes an image post to an Instagram business account
pub struct InstagramPublisher {
    client: reqwest::Client,
    config: InstagramConfig,
}

impl InstagramPublisher {
    pub fn new(client: reqwest::Client, config: InstagramConfig) -> Self {
        Self { client, config }
    }

    /// The request's own image wins over the configured default.
    fn resolve_image<'a>(&'a self, request: &'a PublishRequest) -> Result<&'a str, PublishError> {
        request
            .image_url
            .as_deref()
            .or_else(|| self.config.default_image_url())
            .ok_or(PublishError::MissingImage)
    }

    /// POST one step of the flow and return the id the Graph API assigned.
    async fn call_graph<B: Serialize + ?Sized>(
        &self,
        step: GraphStep,
        business_id: &str,
        body: &B,
    ) -> Result<String> {
        let url = format!(
            "{}/{}/{}",
            self.config.effective_graph_base_url(),
            business_id,
            step.edge()
        );

        debug!("Instagram step '{}': POST {}", step, url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send Instagram {} request", step))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read Instagram {} response", step))?;

        match decode_graph(status, &bytes)?.into_result(step.fallback()) {
            Ok(id) => id.context("Instagram Graph API reply had no id"),
            Err(e) => {
                warn!("Instagram step '{}' rejected ({}): {}", step, status, e);
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl Publisher for InstagramPublisher {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn publish(&self, request: &PublishRequest) -> Result<String> {
        let access_token = require(self.config.access_token(), IG_ACCESS_TOKEN)?;
        let business_id = require(self.config.business_id(), IG_BUSINESS_ID)?;
        let image_url = self.resolve_image(request)?;

        let container_id = self
            .call_graph(
                GraphStep::CreateContainer,
                business_id,
                &CreateContainerRequest {
                    caption: &request.message,
                    image_url,
                    access_token,
                },
            )
            .await?;
        debug!("Instagram container {} created", container_id);

        let media_id = self
            .call_graph(
                GraphStep::PublishContainer,
                business_id,
                &PublishContainerRequest {
                    creation_id: &container_id,
                    access_token,
                },
            )
            .await?;
        info!("Instagram media {} published", media_id);

        Ok(format!(
            "Post published to {}.",
            Platform::Instagram.display_name()
        ))
    }
}
