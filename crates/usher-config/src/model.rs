// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Usher booking assistant.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Usher configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UsherConfig {
    /// Assistant identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Generation backend selection.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Local Ollama backend settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Hosted Gemini backend settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Semantic search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Session context settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// Reply/result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Embedding model settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Assistant identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt override. Defaults to the built-in booking prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Cap on generated reply length, in tokens.
    #[serde(default = "default_max_reply_tokens")]
    pub max_reply_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            max_reply_tokens: default_max_reply_tokens(),
        }
    }
}

fn default_agent_name() -> String {
    "usher".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_reply_tokens() -> u32 {
    120
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Path to the flat-file event catalog.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path to the JSON booking ledger.
    #[serde(default = "default_bookings_path")]
    pub bookings_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            catalog_path: default_catalog_path(),
            bookings_path: default_bookings_path(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_catalog_path() -> String {
    "catalog.txt".to_string()
}

fn default_bookings_path() -> String {
    "bookings.json".to_string()
}

/// Which generation backend to construct at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Backend name: "ollama" or "gemini".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Total wait bound for one generation call, in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_backend() -> String {
    "ollama".to_string()
}

fn default_generation_timeout() -> u64 {
    30
}

/// Local Ollama backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Chat endpoint URL.
    #[serde(default = "default_ollama_url")]
    pub url: String,

    /// Model identifier.
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_ollama_model(),
            temperature: default_temperature(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434/api/chat".to_string()
}

fn default_ollama_model() -> String {
    "mistral".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

/// Hosted Gemini backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` degrades the backend to a configuration notice.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            temperature: default_temperature(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Semantic search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Results returned for a free-text search.
    #[serde(default = "default_search_top_k")]
    pub top_k: usize,

    /// Results returned for a find-similar query.
    #[serde(default = "default_similar_top_k")]
    pub similar_top_k: usize,

    /// Minimum relevance score to include a result, exclusive.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    /// TTL for cached result sets, in seconds.
    #[serde(default = "default_search_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_search_top_k(),
            similar_top_k: default_similar_top_k(),
            relevance_threshold: default_relevance_threshold(),
            cache_ttl_secs: default_search_cache_ttl(),
        }
    }
}

fn default_search_top_k() -> usize {
    5
}

fn default_similar_top_k() -> usize {
    3
}

fn default_relevance_threshold() -> f32 {
    0.3
}

fn default_search_cache_ttl() -> u64 {
    300
}

/// Session context configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Conversation turns retained per session.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,

    /// Recently mentioned event ids retained per session.
    #[serde(default = "default_mentioned_events")]
    pub mentioned_events: usize,

    /// Session expiry since last write, in seconds.
    #[serde(default = "default_context_ttl")]
    pub ttl_secs: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_turns: default_history_turns(),
            mentioned_events: default_mentioned_events(),
            ttl_secs: default_context_ttl(),
        }
    }
}

fn default_history_turns() -> usize {
    6
}

fn default_mentioned_events() -> usize {
    3
}

fn default_context_ttl() -> u64 {
    3600
}

/// Reply/result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Whether to run with a cache at all. Disabled runs stateless.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Maximum cached entries.
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,

    /// TTL for cached generated replies, in seconds.
    #[serde(default = "default_reply_ttl")]
    pub reply_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            capacity: default_cache_capacity(),
            reply_ttl_secs: default_reply_ttl(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_reply_ttl() -> u64 {
    300
}

/// Embedding model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Path to the ONNX model file. `tokenizer.json` is expected alongside it.
    #[serde(default = "default_model_path")]
    pub model_path: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
        }
    }
}

fn default_model_path() -> String {
    "models/all-MiniLM-L6-v2/model.onnx".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = UsherConfig::default();
        assert_eq!(config.agent.name, "usher");
        assert_eq!(config.provider.backend, "ollama");
        assert_eq!(config.search.top_k, 5);
        assert_eq!(config.context.history_turns, 6);
        assert_eq!(config.context.mentioned_events, 3);
        assert_eq!(config.context.ttl_secs, 3600);
        assert_eq!(config.provider.timeout_secs, 30);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[provider]
backend = "gemini"

[gemini]
api_key = "test-key"
"#;
        let config: UsherConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.backend, "gemini");
        assert_eq!(config.gemini.api_key.as_deref(), Some("test-key"));
        // Untouched sections keep defaults.
        assert_eq!(config.ollama.model, "mistral");
        assert!((config.search.relevance_threshold - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml_str = r#"
[agent]
name = "usher"
unknown_field = true
"#;
        assert!(toml::from_str::<UsherConfig>(toml_str).is_err());
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let toml_str = r#"
[telephony]
enabled = true
"#;
        assert!(toml::from_str::<UsherConfig>(toml_str).is_err());
    }
}
