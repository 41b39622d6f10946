// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memohome doctor` command implementation.
//!
//! Checks that configuration, the memory database and the configured models
//! are usable before any memory is written.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use memohome_config::{EmbeddingModelConfig, MemohomeConfig, StorageConfig};
use memohome_core::traits::EmbeddingAdapter;
use memohome_core::types::EmbeddingInput;
use memohome_core::{HealthStatus, MemohomeError, PluginAdapter, SimilarityMetric};
use memohome_openai::{OpenAiEmbedder, OpenAiProvider};
use memohome_storage::SqliteMemoryStore;

/// Bound on the live embedding probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `memohome doctor` command.
///
/// Returns an error when any check failed so the process exits non-zero.
pub async fn run_doctor(config: &MemohomeConfig, plain: bool) -> Result<(), MemohomeError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_memory_enabled(config),
        check_database(&config.storage, config.memory.similarity_metric).await,
        check_summary_model(config).await,
        check_embedding_model(config.models.embedding.as_ref()).await,
        check_memory_baseline(),
    ];

    println!();
    println!("  memohome doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", format_line(result, use_color));
    }
    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    if fail_count > 0 {
        return Err(MemohomeError::Config(format!(
            "{fail_count} doctor check(s) failed"
        )));
    }
    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!(
            "    {symbol} {:<18} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<18} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

fn check_memory_enabled(config: &MemohomeConfig) -> CheckResult {
    let start = Instant::now();
    if config.memory.enabled {
        CheckResult::new(
            "Memory",
            CheckStatus::Pass,
            format!(
                "enabled (top_k={}, metric={})",
                config.memory.default_top_k, config.memory.similarity_metric
            ),
            start,
        )
    } else {
        CheckResult::new("Memory", CheckStatus::Warn, "disabled in [memory]", start)
    }
}

/// Opens the database, applying pending migrations, and runs a health query.
async fn check_database(storage: &StorageConfig, metric: SimilarityMetric) -> CheckResult {
    let start = Instant::now();
    let path = std::path::Path::new(&storage.database_path);

    if !path.exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!(
                "not found: {} (created on first add)",
                storage.database_path
            ),
            start,
        );
    }

    let store = match SqliteMemoryStore::open(storage, metric).await {
        Ok(store) => store,
        Err(e) => {
            return CheckResult::new("Database", CheckStatus::Fail, format!("open failed: {e}"), start);
        }
    };

    let result = match store.health_check().await {
        Ok(HealthStatus::Healthy) => {
            CheckResult::new("Database", CheckStatus::Pass, "connected", start)
        }
        Ok(HealthStatus::Degraded(msg)) => {
            CheckResult::new("Database", CheckStatus::Warn, msg, start)
        }
        Ok(HealthStatus::Unhealthy(msg)) => {
            CheckResult::new("Database", CheckStatus::Fail, msg, start)
        }
        Err(e) => CheckResult::new("Database", CheckStatus::Fail, e.to_string(), start),
    };
    let _ = store.shutdown().await;
    result
}

async fn check_summary_model(config: &MemohomeConfig) -> CheckResult {
    let start = Instant::now();
    let Some(model) = config.models.summary_model() else {
        return CheckResult::new(
            "Summary model",
            CheckStatus::Fail,
            "not configured ([models.summary] or [models.chat])",
            start,
        );
    };

    match OpenAiProvider::from_config(model) {
        Ok(provider) => match provider.health_check().await {
            Ok(HealthStatus::Healthy) => CheckResult::new(
                "Summary model",
                CheckStatus::Pass,
                format!("{} at {}", model.model_id, model.base_url),
                start,
            ),
            Ok(status) => CheckResult::new(
                "Summary model",
                CheckStatus::Warn,
                format!("{status:?}"),
                start,
            ),
            Err(e) => CheckResult::new("Summary model", CheckStatus::Fail, e.to_string(), start),
        },
        Err(e) => CheckResult::new("Summary model", CheckStatus::Fail, e.to_string(), start),
    }
}

/// Embeds a probe sentence and compares the vector length with configuration.
async fn check_embedding_model(model: Option<&EmbeddingModelConfig>) -> CheckResult {
    let start = Instant::now();
    let Some(model) = model else {
        return CheckResult::new(
            "Embedding model",
            CheckStatus::Fail,
            "not configured ([models.embedding])",
            start,
        );
    };

    let embedder = match OpenAiEmbedder::from_config(model) {
        Ok(embedder) => embedder,
        Err(e) => {
            return CheckResult::new("Embedding model", CheckStatus::Fail, e.to_string(), start);
        }
    };

    let probe = EmbeddingInput {
        texts: vec!["memohome doctor probe".to_string()],
    };
    match tokio::time::timeout(PROBE_TIMEOUT, embedder.embed(probe)).await {
        Ok(Ok(output)) => {
            let actual = output.embeddings.first().map_or(0, Vec::len);
            if actual == model.dimensions {
                CheckResult::new(
                    "Embedding model",
                    CheckStatus::Pass,
                    format!("{} ({actual} dimensions)", model.model_id),
                    start,
                )
            } else {
                CheckResult::new(
                    "Embedding model",
                    CheckStatus::Fail,
                    format!(
                        "returned {actual} dimensions, configured {}",
                        model.dimensions
                    ),
                    start,
                )
            }
        }
        Ok(Err(e)) => CheckResult::new("Embedding model", CheckStatus::Fail, e.to_string(), start),
        Err(_) => CheckResult::new(
            "Embedding model",
            CheckStatus::Fail,
            format!("timeout ({}s)", PROBE_TIMEOUT.as_secs()),
            start,
        ),
    }
}

fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        let allocated_mb = allocated as f64 / (1024.0 * 1024.0);
        let resident_mb = resident as f64 / (1024.0 * 1024.0);

        CheckResult::new(
            "Memory baseline",
            CheckStatus::Pass,
            format!("heap: {allocated_mb:.1} MB, resident: {resident_mb:.1} MB"),
            start,
        )
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult::new(
            "Memory baseline",
            CheckStatus::Warn,
            "jemalloc not available on MSVC",
            start,
        )
    }
}
