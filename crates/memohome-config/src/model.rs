// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for memohome.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use memohome_core::SimilarityMetric;
use serde::{Deserialize, Serialize};

/// Top-level memohome configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemohomeConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Memory engine settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Model endpoints used for chat, summarization and embedding.
    #[serde(default)]
    pub models: ModelsConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "memohome".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("memohome").join("memohome.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("memohome.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Memory engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable the memory system. When false, agents run without recall.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    /// Number of results returned by a search when the caller does not pass `k`.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Metric used to rank nearest neighbors.
    #[serde(default)]
    pub similarity_metric: SimilarityMetric,

    /// Minimum similarity for a search hit. `None` keeps every ranked hit.
    #[serde(default)]
    pub similarity_threshold: Option<f64>,

    /// Upper bound, in characters, of the raw-text summary used when summarization fails.
    #[serde(default = "default_fallback_summary_chars")]
    pub fallback_summary_chars: usize,

    /// Maximum tokens the summary model may generate.
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    /// Seconds before a summarization call is abandoned.
    #[serde(default = "default_summarization_timeout_secs")]
    pub summarization_timeout_secs: u64,

    /// Seconds before an embedding call is abandoned.
    #[serde(default = "default_embedding_timeout_secs")]
    pub embedding_timeout_secs: u64,

    /// Minutes of recent history an agent loads as context before a turn.
    #[serde(default = "default_max_context_load_minutes")]
    pub max_context_load_minutes: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            default_top_k: default_top_k(),
            similarity_metric: SimilarityMetric::default(),
            similarity_threshold: None,
            fallback_summary_chars: default_fallback_summary_chars(),
            summary_max_tokens: default_summary_max_tokens(),
            summarization_timeout_secs: default_summarization_timeout_secs(),
            embedding_timeout_secs: default_embedding_timeout_secs(),
            max_context_load_minutes: default_max_context_load_minutes(),
        }
    }
}

fn default_memory_enabled() -> bool {
    true
}

fn default_top_k() -> usize {
    5
}

fn default_fallback_summary_chars() -> usize {
    2000
}

fn default_summary_max_tokens() -> u32 {
    1024
}

fn default_summarization_timeout_secs() -> u64 {
    60
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

fn default_max_context_load_minutes() -> u64 {
    60
}

/// Model endpoints. Each is optional; commands that need one fail with a config error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    /// Model driving the main conversation.
    #[serde(default)]
    pub chat: Option<ChatModelConfig>,

    /// Model used to summarize finished conversations. Falls back to `chat` when unset.
    #[serde(default)]
    pub summary: Option<ChatModelConfig>,

    /// Model used to embed summaries and queries.
    #[serde(default)]
    pub embedding: Option<EmbeddingModelConfig>,
}

impl ModelsConfig {
    /// The model to summarize with: `summary` if configured, otherwise `chat`.
    pub fn summary_model(&self) -> Option<&ChatModelConfig> {
        self.summary.as_ref().or(self.chat.as_ref())
    }
}

/// An OpenAI-compatible chat model endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatModelConfig {
    /// Model identifier sent to the API.
    pub model_id: String,

    /// API base URL, e.g. `https://api.openai.com/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. `None` sends no Authorization header (local servers).
    #[serde(default)]
    pub api_key: Option<String>,

    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// An OpenAI-compatible embedding model endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingModelConfig {
    /// Model identifier sent to the API.
    pub model_id: String,

    /// API base URL, e.g. `https://api.openai.com/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. `None` sends no Authorization header (local servers).
    #[serde(default)]
    pub api_key: Option<String>,

    /// Fixed vector length produced by this model.
    pub dimensions: usize,

    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_model_falls_back_to_chat() {
        let models = ModelsConfig {
            chat: Some(ChatModelConfig {
                model_id: "gpt-4o".into(),
                base_url: default_base_url(),
                api_key: None,
                name: None,
            }),
            summary: None,
            embedding: None,
        };
        assert_eq!(models.summary_model().unwrap().model_id, "gpt-4o");
    }

    #[test]
    fn memory_defaults() {
        let memory = MemoryConfig::default();
        assert!(memory.enabled);
        assert_eq!(memory.default_top_k, 5);
        assert_eq!(memory.similarity_metric, SimilarityMetric::Cosine);
        assert!(memory.similarity_threshold.is_none());
        assert_eq!(memory.max_context_load_minutes, 60);
    }
}
