use serde::{Deserialize, Serialize};

/// Sampling defaults applied when the caller omits a parameter.
pub const DEFAULT_TEMPERATURE: f64 = 0.6;
pub const DEFAULT_TOP_P: f64 = 1.0;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_PRESENCE_PENALTY: f64 = 0.0;
pub const DEFAULT_FREQUENCY_PENALTY: f64 = 0.0;

/// A single message in the conversation history.
///
/// `role` is an open string; any role the provider understands relays
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `POST /v1/chat/completions`.
///
/// Only the recognized options are modeled; unknown caller fields are
/// dropped on deserialization and never reach the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default)]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
    /// Conversation identifier used to namespace stored reflections and
    /// memory entries. Never forwarded to the provider.
    #[serde(rename = "currentThreadId", skip_serializing_if = "Option::is_none")]
    pub current_thread_id: Option<String>,
}

impl ChatRequest {
    /// Names of required fields the caller left out.
    ///
    /// `messages` counts as missing when present but empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.model.as_deref().map_or(true, str::is_empty) {
            missing.push("model");
        }
        if self.messages.is_empty() {
            missing.push("messages");
        }
        missing
    }

    /// The most recent user-role message, if any.
    pub fn last_user_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == "user")
    }
}
