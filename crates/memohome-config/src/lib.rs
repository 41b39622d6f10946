// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the memohome memory engine.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use memohome_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Top-k: {}", config.memory.default_top_k);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, ConfigSource, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str, render_toml};
pub use model::{
    ChatModelConfig, EmbeddingModelConfig, MemohomeConfig, MemoryConfig, ModelsConfig,
    StorageConfig,
};

/// Load from the standard locations and validate.
///
/// Every problem is returned at once: figment errors when the layers do not
/// deserialize, otherwise all semantic validation failures.
pub fn load_and_validate() -> Result<MemohomeConfig, Vec<ConfigError>> {
    checked(loader::load_config(), standard_sources)
}

/// Load from one file (plus env overrides) and validate.
pub fn load_and_validate_path(path: &Path) -> Result<MemohomeConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        ConfigSource::from_file(path).into_iter().collect()
    })
}

/// Load from a TOML string and validate. No files or environment are consulted.
pub fn load_and_validate_str(toml_content: &str) -> Result<MemohomeConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![ConfigSource::inline(toml_content)]
    })
}

/// Sources are only read back when extraction failed and spans are needed.
fn checked(
    loaded: Result<MemohomeConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<ConfigSource>,
) -> Result<MemohomeConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::from_figment(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// The file layers `load_config` merges, in precedence order, that exist on disk.
fn standard_sources() -> Vec<ConfigSource> {
    let local = std::env::current_dir()
        .map(|dir| dir.join(loader::LOCAL_CONFIG_FILE))
        .unwrap_or_else(|_| PathBuf::from(loader::LOCAL_CONFIG_FILE));

    [
        Some(local),
        loader::user_config_path(),
        Some(PathBuf::from(loader::SYSTEM_CONFIG_PATH)),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| ConfigSource::from_file(&path))
    .collect()
}
