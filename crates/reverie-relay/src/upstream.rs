//! HTTP client for the upstream inference provider.

use reqwest::StatusCode;
use serde_json::{json, Value};

use reverie_types::chat::{
    ChatRequest, DEFAULT_FREQUENCY_PENALTY, DEFAULT_MAX_TOKENS, DEFAULT_PRESENCE_PENALTY,
    DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
};

use crate::error::RelayError;

pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Non-streaming chat completion. Returns the provider's raw body
    /// text so the caller can relay it byte-for-byte.
    pub async fn chat(&self, api_key: &str, request: &ChatRequest) -> Result<String, RelayError> {
        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&payload(request, false))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(upstream_error(status, response).await);
        }
        Ok(response.text().await?)
    }

    /// Streaming chat completion. Returns the raw response whose byte
    /// stream the caller relays untouched.
    pub async fn chat_stream(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<reqwest::Response, RelayError> {
        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&payload(request, true))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(upstream_error(status, response).await);
        }
        Ok(response)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

async fn upstream_error(status: StatusCode, response: reqwest::Response) -> RelayError {
    let body = response.text().await.unwrap_or_default();
    RelayError::Upstream { status, body }
}

/// Build the provider payload: caller-supplied values over the
/// documented defaults. `tools` and `tool_choice` appear only when the
/// caller supplied tools; the thread identifier never leaves the relay.
fn payload(request: &ChatRequest, stream: bool) -> Value {
    let mut payload = json!({
        "model": request.model,
        "messages": request.messages,
        "temperature": request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        "top_p": request.top_p.unwrap_or(DEFAULT_TOP_P),
        "top_k": request.top_k.unwrap_or(DEFAULT_TOP_K),
        "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "presence_penalty": request.presence_penalty.unwrap_or(DEFAULT_PRESENCE_PENALTY),
        "frequency_penalty": request.frequency_penalty.unwrap_or(DEFAULT_FREQUENCY_PENALTY),
        "stream": stream,
    });

    if let Some(tools) = &request.tools {
        if !tools.is_empty() {
            payload["tools"] = json!(tools);
            if let Some(choice) = &request.tool_choice {
                payload["tool_choice"] = choice.clone();
            }
        }
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use reverie_types::chat::ChatMessage;

    fn request() -> ChatRequest {
        ChatRequest {
            model: Some("test-model".to_string()),
            messages: vec![ChatMessage::user("hello")],
            ..Default::default()
        }
    }

    #[test]
    fn payload_applies_documented_defaults() {
        let body = payload(&request(), false);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["temperature"], 0.6);
        assert_eq!(body["top_p"], 1.0);
        assert_eq!(body["top_k"], 40);
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["presence_penalty"], 0.0);
        assert_eq!(body["frequency_penalty"], 0.0);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn payload_prefers_caller_values() {
        let body = payload(
            &ChatRequest {
                temperature: Some(0.95),
                top_k: Some(5),
                max_tokens: Some(64),
                ..request()
            },
            true,
        );
        assert_eq!(body["temperature"], 0.95);
        assert_eq!(body["top_k"], 5);
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn payload_omits_tools_when_none_supplied() {
        let body = payload(&request(), false);
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn payload_omits_tool_choice_without_tools() {
        let body = payload(
            &ChatRequest {
                tool_choice: Some(json!("auto")),
                ..request()
            },
            false,
        );
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn payload_carries_tools_and_choice_together() {
        let body = payload(
            &ChatRequest {
                tools: Some(vec![json!({"type": "function"})]),
                tool_choice: Some(json!("auto")),
                ..request()
            },
            false,
        );
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn payload_never_forwards_thread_id() {
        let body = payload(
            &ChatRequest {
                current_thread_id: Some("t-1".to_string()),
                ..request()
            },
            false,
        );
        assert!(body.get("currentThreadId").is_none());
        assert!(body.get("current_thread_id").is_none());
    }
}
