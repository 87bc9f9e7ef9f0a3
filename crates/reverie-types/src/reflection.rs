use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An annotation extracted from assistant output.
///
/// Exists only within one request's processing: written once to the
/// key-value store, never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl Reflection {
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
        }
    }
}

/// Persisted form of a [`Reflection`], tagged with its thread and an
/// RFC 3339 timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    pub timestamp: String,
}

impl ReflectionRecord {
    pub fn new(reflection: Reflection, thread_id: impl Into<String>) -> Self {
        Self {
            kind: reflection.kind,
            content: reflection.content,
            thread_id: thread_id.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Storage key: `reflection:<thread>:<timestamp>:<suffix>`.
    ///
    /// The random suffix keeps keys distinct for records created within
    /// the same instant.
    pub fn storage_key(&self) -> String {
        format!(
            "reflection:{}:{}:{}",
            self.thread_id,
            self.timestamp,
            Uuid::new_v4().simple()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_has_composite_shape() {
        let record = ReflectionRecord::new(
            Reflection::new("BRIEF REFLECTION", "noted"),
            "thread-9",
        );
        let key = record.storage_key();
        let prefix = format!("reflection:thread-9:{}:", record.timestamp);
        assert!(key.starts_with(&prefix), "unexpected key: {key}");
        assert!(key.len() > prefix.len(), "suffix missing: {key}");
    }

    #[test]
    fn storage_keys_differ_within_one_instant() {
        let record = ReflectionRecord::new(Reflection::new("t", "c"), "thread");
        assert_ne!(record.storage_key(), record.storage_key());
    }

    #[test]
    fn record_serializes_wire_field_names() {
        let record = ReflectionRecord::new(
            Reflection::new("DETAILED REFLECTION 1", "body"),
            "t-1",
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "DETAILED REFLECTION 1");
        assert_eq!(value["threadId"], "t-1");
        assert!(value["timestamp"].is_string());
    }
}
