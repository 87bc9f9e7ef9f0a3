//! Relay configuration.
//!
//! Service settings come from `REVERIE_*` environment variables once at
//! startup; the two collaborator credentials are read from the
//! environment on every invocation instead of being cached.

use crate::error::RelayError;

/// Environment variable holding the inference-provider API key.
pub const INFERENCE_API_KEY: &str = "INFERENCE_API_KEY";
/// Environment variable holding the memory-service API key.
pub const MEMORY_API_KEY: &str = "MEMORY_API_KEY";

/// Runtime configuration for the relay, loaded once at startup.
///
/// Every field has a default so the server starts without any
/// environment variables set.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// TCP address to bind (default `"0.0.0.0:8787"`).
    pub bind_address: String,
    /// Base URL of the inference provider.
    pub upstream_url: String,
    /// Base URL of the reflection key-value store.
    pub kv_url: String,
    /// Base URL of the long-term memory service.
    pub memory_url: String,
    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,
}

impl RelayConfig {
    /// Build [`RelayConfig`] from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("REVERIE_BIND", "0.0.0.0:8787"),
            upstream_url: env_or("REVERIE_UPSTREAM_URL", "https://api.together.xyz/v1"),
            kv_url: env_or("REVERIE_KV_URL", "http://127.0.0.1:8686"),
            memory_url: env_or("REVERIE_MEMORY_URL", "https://api.mem0.ai"),
            log_level: env_or("REVERIE_LOG", "info"),
        }
    }
}

/// The two secrets required for every chat invocation.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub inference_api_key: String,
    pub memory_api_key: String,
}

impl Credentials {
    /// Read both required secrets from the environment, naming every
    /// variable that is absent or empty.
    pub fn from_env() -> Result<Self, RelayError> {
        let inference = non_empty_env(INFERENCE_API_KEY);
        let memory = non_empty_env(MEMORY_API_KEY);

        match (inference, memory) {
            (Some(inference_api_key), Some(memory_api_key)) => Ok(Self {
                inference_api_key,
                memory_api_key,
            }),
            (inference, memory) => {
                let mut missing = Vec::new();
                if inference.is_none() {
                    missing.push(INFERENCE_API_KEY);
                }
                if memory.is_none() {
                    missing.push(MEMORY_API_KEY);
                }
                Err(RelayError::MissingCredentials(missing.join(", ")))
            }
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_to_default() {
        assert_eq!(
            env_or("REVERIE_TEST_UNSET_VARIABLE", "fallback"),
            "fallback"
        );
    }

    #[test]
    fn non_empty_env_rejects_empty_values() {
        std::env::set_var("REVERIE_TEST_EMPTY_VARIABLE", "");
        assert!(non_empty_env("REVERIE_TEST_EMPTY_VARIABLE").is_none());
    }
}
