use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info, info_span, Instrument};

use crate::config::Config;
use crate::error::PublishError;
use crate::platform::instagram::InstagramPublisher;
use crate::platform::telegram::TelegramPublisher;
use crate::platform::{Platform, Publisher};
use crate::request::PublishRequest;

/// Validates publish requests and routes them to the matching publisher.
///
/// This is the one place publisher failures are caught: typed
/// [`PublishError`]s keep their kind, everything else (including a panic
/// inside a publisher) becomes [`PublishError::Unexpected`].
pub struct Dispatcher {
    telegram: Arc<dyn Publisher>,
    instagram: Arc<dyn Publisher>,
}

impl Dispatcher {
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        Self::with_publishers(
            Arc::new(TelegramPublisher::new(
                client.clone(),
                config.telegram.clone(),
            )),
            Arc::new(InstagramPublisher::new(client, config.instagram.clone())),
        )
    }

    pub fn with_publishers(telegram: Arc<dyn Publisher>, instagram: Arc<dyn Publisher>) -> Self {
        Self {
            telegram,
            instagram,
        }
    }

    fn publisher_for(&self, platform: Platform) -> &dyn Publisher {
        match platform {
            Platform::Telegram => self.telegram.as_ref(),
            Platform::Instagram => self.instagram.as_ref(),
        }
    }

    /// Validate a raw body and publish it. Returns the success description.
    pub async fn handle(&self, body: &[u8]) -> Result<String, PublishError> {
        let request_id = uuid::Uuid::new_v4();
        let span = info_span!("publish", %request_id);

        let request = match PublishRequest::parse(body) {
            Ok(request) => request,
            Err(e) => {
                info!(parent: &span, "Rejected publish request: {}", e);
                return Err(e);
            }
        };

        self.dispatch(&request).instrument(span).await
    }

    /// Publish an already validated request.
    pub async fn dispatch(&self, request: &PublishRequest) -> Result<String, PublishError> {
        let publisher = self.publisher_for(request.platform);
        info!(
            "Publishing to {} ({} chars)",
            publisher.platform(),
            request.message.chars().count()
        );

        let outcome = AssertUnwindSafe(publisher.publish(request))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(err)) => match err.downcast::<PublishError>() {
                Ok(known) => Err(known),
                Err(other) => {
                    error!("Publishing to {} failed: {:#}", request.platform, other);
                    Err(PublishError::unexpected(format!("{:#}", other)))
                }
            },
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                error!("Publisher for {} panicked: {}", request.platform, detail);
                Err(PublishError::unexpected(detail))
            }
        }
    }
}
