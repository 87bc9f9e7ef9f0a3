//! Reflection persistence: a key-value store reached over HTTP.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Write access to the reflection key-value store.
///
/// Implement this trait to swap the HTTP store for another backend (or
/// a recording mock in tests) without touching the handler.
#[async_trait]
pub trait ReflectionStore: Send + Sync {
    async fn put(&self, key: &str, value: &Value) -> Result<()>;
}

/// HTTP implementation: `PUT <base>/<key>` with the record as JSON body.
pub struct HttpKvStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpKvStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ReflectionStore for HttpKvStore {
    async fn put(&self, key: &str, value: &Value) -> Result<()> {
        let response = self
            .client
            .put(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
            .json(value)
            .send()
            .await
            .context("Failed to send key-value write")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Key-value store error ({status}): {body}");
        }
        Ok(())
    }
}
