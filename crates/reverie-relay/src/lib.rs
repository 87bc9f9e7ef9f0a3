//! Reverie relay: proxies chat-completion requests to an inference
//! provider, relays streamed replies untouched, and post-processes
//! buffered replies (reflection extraction, key-value persistence,
//! long-term memory storage).

pub mod config;
pub mod error;
pub mod handler;
pub mod memory;
pub mod reflection;
pub mod store;
pub mod upstream;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::memory::{HttpMemoryService, MemoryService};
use crate::store::{HttpKvStore, ReflectionStore};
use crate::upstream::UpstreamClient;

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub upstream: UpstreamClient,
    pub store: Arc<dyn ReflectionStore>,
    pub memory: Arc<dyn MemoryService>,
}

impl AppState {
    /// Wire the real HTTP collaborators from configuration.
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            upstream: UpstreamClient::new(config.upstream_url.clone()),
            store: Arc::new(HttpKvStore::new(config.kv_url.clone())),
            memory: Arc::new(HttpMemoryService::new(config.memory_url.clone())),
        }
    }
}

/// Build the relay router: the chat route, a health probe, permissive
/// CORS (any origin, GET/POST/OPTIONS), and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/v1/chat/completions", post(handler::chat_completions))
        .route("/health", get(handler::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
