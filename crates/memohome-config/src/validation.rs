// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, positive timeouts and sane model endpoints.

use crate::diagnostic::ConfigError;
use crate::model::MemohomeConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Smallest fallback summary worth storing.
const MIN_FALLBACK_SUMMARY_CHARS: usize = 32;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MemohomeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        fail(format!(
            "agent.log_level `{}` must be one of: {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let memory = &config.memory;
    if memory.default_top_k == 0 {
        fail("memory.default_top_k must be at least 1".to_string());
    }

    if let Some(threshold) = memory.similarity_threshold
        && !(-1.0..=1.0).contains(&threshold)
    {
        fail(format!(
            "memory.similarity_threshold must be within [-1.0, 1.0], got {threshold}"
        ));
    }

    if memory.fallback_summary_chars < MIN_FALLBACK_SUMMARY_CHARS {
        fail(format!(
            "memory.fallback_summary_chars must be at least {MIN_FALLBACK_SUMMARY_CHARS}, got {}",
            memory.fallback_summary_chars
        ));
    }

    if memory.summary_max_tokens == 0 {
        fail("memory.summary_max_tokens must be at least 1".to_string());
    }

    if memory.summarization_timeout_secs == 0 {
        fail("memory.summarization_timeout_secs must be at least 1".to_string());
    }

    if memory.embedding_timeout_secs == 0 {
        fail("memory.embedding_timeout_secs must be at least 1".to_string());
    }

    let chat_models = [
        ("models.chat", config.models.chat.as_ref()),
        ("models.summary", config.models.summary.as_ref()),
    ];
    for (section, model) in chat_models {
        if let Some(model) = model {
            if model.model_id.trim().is_empty() {
                fail(format!("{section}.model_id must not be empty"));
            }
            if let Some(message) = check_base_url(section, &model.base_url) {
                fail(message);
            }
        }
    }

    if let Some(embedding) = &config.models.embedding {
        if embedding.model_id.trim().is_empty() {
            fail("models.embedding.model_id must not be empty".to_string());
        }
        if embedding.dimensions == 0 {
            fail("models.embedding.dimensions must be a positive integer".to_string());
        }
        if let Some(message) = check_base_url("models.embedding", &embedding.base_url) {
            fail(message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base_url(section: &str, base_url: &str) -> Option<String> {
    let url = base_url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        None
    } else {
        Some(format!(
            "{section}.base_url `{base_url}` must start with http:// or https://"
        ))
    }
}
