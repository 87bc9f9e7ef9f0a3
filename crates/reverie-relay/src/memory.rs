//! Long-term memory service client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use reverie_types::memory::MemoryTurn;

/// Write access to the long-term memory service.
#[async_trait]
pub trait MemoryService: Send + Sync {
    /// Record one conversation turn (ordered role/content pairs) under
    /// a caller identity.
    async fn add(&self, turns: &[MemoryTurn], user_id: &str, api_key: &str) -> Result<()>;
}

/// HTTP implementation: `POST <base>/v1/memories`, bearer-authenticated.
pub struct HttpMemoryService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMemoryService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MemoryService for HttpMemoryService {
    async fn add(&self, turns: &[MemoryTurn], user_id: &str, api_key: &str) -> Result<()> {
        let response = self
            .client
            .post(format!(
                "{}/v1/memories",
                self.base_url.trim_end_matches('/')
            ))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&json!({ "messages": turns, "user_id": user_id }))
            .send()
            .await
            .context("Failed to send memory write")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Memory service error ({status}): {body}");
        }
        Ok(())
    }
}
