// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./memohome.toml` > `~/.config/memohome/memohome.toml` > `/etc/memohome/memohome.toml`
//! with environment variable overrides via `MEMOHOME_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MemohomeConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/memohome/memohome.toml";

/// Local configuration file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "memohome.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/memohome/memohome.toml` (system-wide)
/// 3. `~/.config/memohome/memohome.toml` (user XDG config)
/// 4. `./memohome.toml` (local directory)
/// 5. `MEMOHOME_*` environment variables
pub fn load_config() -> Result<MemohomeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MemohomeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemohomeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MemohomeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemohomeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Path of the per-user config file, if the platform has a config directory.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("memohome").join(LOCAL_CONFIG_FILE))
}

/// Build the Figment used for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MemohomeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MEMOHOME_MODELS_EMBEDDING_API_KEY` must map to
/// `models.embedding.api_key`, not `models.embedding.api.key`.
fn env_provider() -> Env {
    Env::prefixed("MEMOHOME_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const NESTED: [(&str, &str); 3] = [
        ("models_chat_", "models.chat."),
        ("models_summary_", "models.summary."),
        ("models_embedding_", "models.embedding."),
    ];
    for (prefix, dotted) in NESTED {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{dotted}{rest}");
        }
    }

    const SECTIONS: [&str; 3] = ["agent", "storage", "memory"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }

    key.to_string()
}

/// Render a configuration as TOML, as the `config` command prints it.
pub fn render_toml(config: &MemohomeConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("memory_default_top_k"), "memory.default_top_k");
        assert_eq!(map_env_key("agent_log_level"), "agent.log_level");
    }

    #[test]
    fn env_keys_map_to_nested_model_sections() {
        assert_eq!(map_env_key("models_embedding_api_key"), "models.embedding.api_key");
        assert_eq!(map_env_key("models_summary_model_id"), "models.summary.model_id");
        assert_eq!(map_env_key("models_chat_base_url"), "models.chat.base_url");
    }

    #[test]
    fn unknown_env_key_is_left_alone() {
        assert_eq!(map_env_key("something_else"), "something_else");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[memory]
default_top_k = 3
"#,
            )?;
            jail.set_env("MEMOHOME_MEMORY_DEFAULT_TOP_K", "9");
            jail.set_env("MEMOHOME_MODELS_EMBEDDING_MODEL_ID", "text-embedding-3-small");
            jail.set_env("MEMOHOME_MODELS_EMBEDDING_DIMENSIONS", "1536");

            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.memory.default_top_k, 9);
            let embedding = config.models.embedding.expect("embedding model from env");
            assert_eq!(embedding.model_id, "text-embedding-3-small");
            assert_eq!(embedding.dimensions, 1536);
            Ok(())
        });
    }

    #[test]
    fn rendered_toml_loads_back() {
        let mut config = MemohomeConfig::default();
        config.memory.default_top_k = 7;
        let rendered = render_toml(&config).unwrap();
        let loaded = load_config_from_str(&rendered).unwrap();
        assert_eq!(loaded.memory.default_top_k, 7);
    }
}
