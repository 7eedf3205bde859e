//! HTTP surface: the publish endpoint plus the form that drives it.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::request::PublishResult;

// The form is embedded at compile time, no runtime file needed.
const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/health", get(health_check))
        .route("/api/publish", post(publish))
        .with_state(state)
}

async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_check() -> &'static str {
    "OK"
}

// Takes raw bytes so malformed JSON is reported in the uniform result shape
// rather than as axum's plain-text rejection.
async fn publish(State(state): State<AppState>, body: Bytes) -> Response {
    match state.dispatcher.handle(&body).await {
        Ok(message) => (StatusCode::OK, Json(PublishResult::success(message))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Serve until Ctrl-C.
pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;

    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}
