//! The chat relay handler.
//!
//! Per-request flow: validate the body, confirm both credentials,
//! forward to the inference provider, then either relay the event
//! stream untouched or post-process the buffered reply (reflection
//! extraction, key-value persistence, memory storage). Post-processing
//! is best-effort: its failures are logged and never reach the caller.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use reverie_types::chat::ChatRequest;
use reverie_types::memory::MemoryTurn;
use reverie_types::reflection::ReflectionRecord;

use crate::config::Credentials;
use crate::error::RelayError;
use crate::reflection::extract_reflections;
use crate::AppState;

/// Fallback thread key for persisted reflections.
const DEFAULT_THREAD_ID: &str = "unknown-thread";
/// Fallback memory-service user id. Deliberately distinct from
/// [`DEFAULT_THREAD_ID`]; see DESIGN.md.
const DEFAULT_USER_ID: &str = "default-user";

/// `POST /v1/chat/completions`.
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, RelayError> {
    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(RelayError::MissingFields(missing.join(", ")));
    }

    // Both secrets must be readable before any network call is made.
    let credentials = Credentials::from_env()?;

    debug!(
        model = request.model.as_deref().unwrap_or_default(),
        messages = request.messages.len(),
        stream = request.stream,
        "chat relay request"
    );

    if request.stream {
        return relay_stream(&state, &credentials, &request).await;
    }

    let raw_body = state
        .upstream
        .chat(&credentials.inference_api_key, &request)
        .await?;

    post_process(&state, &credentials, &request, &raw_body).await;

    // The provider's body goes back byte-for-byte.
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        raw_body,
    )
        .into_response())
}

/// `GET /health`.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Relay the provider's event stream to the caller unmodified, chunk by
/// chunk. A mid-stream read error becomes one terminal event before the
/// connection closes.
async fn relay_stream(
    state: &AppState,
    credentials: &Credentials,
    request: &ChatRequest,
) -> Result<Response, RelayError> {
    let upstream = state
        .upstream
        .chat_stream(&credentials.inference_api_key, request)
        .await?;

    let mut chunks = upstream.bytes_stream();
    let relayed = async_stream::stream! {
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(chunk) => yield Ok::<Bytes, std::convert::Infallible>(chunk),
                Err(e) => {
                    warn!(error = %e, "upstream stream interrupted");
                    let event = json!({
                        "error": {
                            "type": "stream_interrupted",
                            "message": e.to_string(),
                        }
                    });
                    yield Ok(Bytes::from(format!("data: {event}\n\n")));
                    break;
                }
            }
        }
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(relayed),
    )
        .into_response())
}

/// Extract reflections from the buffered reply, persist them, and store
/// the conversation turn. Every failure here is logged and swallowed.
async fn post_process(
    state: &AppState,
    credentials: &Credentials,
    request: &ChatRequest,
    raw_body: &str,
) {
    let body: Value = serde_json::from_str(raw_body).unwrap_or(Value::Null);
    let reply = body["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default();

    let reflections = extract_reflections(reply);
    if !reflections.is_empty() {
        info!(count = reflections.len(), "extracted reflections");
    }

    let thread_id = request
        .current_thread_id
        .as_deref()
        .unwrap_or(DEFAULT_THREAD_ID);
    for reflection in reflections {
        let record = ReflectionRecord::new(reflection, thread_id);
        let key = record.storage_key();
        let written = match serde_json::to_value(&record) {
            Ok(value) => state.store.put(&key, &value).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = written {
            warn!(error = %e, key = %key, "reflection write failed; continuing");
        }
    }

    // One memory entry per turn: the most recent user message plus the
    // raw, unparsed reply. Skipped when either side is absent.
    let Some(user_message) = request.last_user_message() else {
        return;
    };
    if reply.is_empty() {
        return;
    }

    let turns = [
        MemoryTurn::user(&user_message.content),
        MemoryTurn::assistant(reply),
    ];
    let user_id = request
        .current_thread_id
        .as_deref()
        .unwrap_or(DEFAULT_USER_ID);
    if let Err(e) = state
        .memory
        .add(&turns, user_id, &credentials.memory_api_key)
        .await
    {
        warn!(error = %e, "memory write failed; continuing");
    }
}
