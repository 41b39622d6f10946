// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! memohome - long-term conversational memory for AI agents.
//!
//! This is the binary entry point. Every data command prints JSON on stdout;
//! logs and diagnostics go to stderr.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod doctor;
mod runtime;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use memohome_config::MemohomeConfig;
use memohome_core::MemohomeError;

use crate::commands::{Transcript, parse_timestamp, print_json};

/// memohome - long-term conversational memory for AI agents.
#[derive(Parser, Debug)]
#[command(name = "memohome", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize, embed and store a finished conversation.
    Add {
        /// Owner of the memory.
        #[arg(long)]
        user: String,
        /// JSON transcript: a message array or {"messages": [...], "timestamp": ...}.
        #[arg(long, value_name = "TRANSCRIPT")]
        file: PathBuf,
        /// When the conversation ended (RFC 3339). Defaults to the file's timestamp, then now.
        #[arg(long, value_parser = parse_timestamp)]
        timestamp: Option<DateTime<Utc>>,
        /// Retrying with the same key returns the first stored memory.
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Find the memories most similar to a query.
    Search {
        query: String,
        #[arg(long)]
        user: String,
        /// Maximum number of results (defaults to [memory] default_top_k).
        #[arg(short)]
        k: Option<usize>,
    },
    /// List memories whose timestamp falls within an inclusive range, oldest first.
    Read {
        #[arg(long)]
        user: String,
        #[arg(long, value_parser = parse_timestamp)]
        from: DateTime<Utc>,
        #[arg(long, value_parser = parse_timestamp)]
        to: DateTime<Utc>,
    },
    /// Page through memories, newest first.
    Recent {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Page number, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Check configuration, storage and model connectivity.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => memohome_config::load_and_validate_path(path),
        None => memohome_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            memohome_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);
    memohome_memory::register_metrics();

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("memohome: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &MemohomeConfig) -> Result<(), MemohomeError> {
    match command {
        Commands::Add {
            user,
            file,
            timestamp,
            idempotency_key,
        } => {
            let transcript = Transcript::read(&file).await?;
            let engine = runtime::build_engine(config).await?;
            let unit =
                commands::add(&engine, &user, transcript, timestamp, idempotency_key).await?;
            print_json(&unit)
        }
        Commands::Search { query, user, k } => {
            let engine = runtime::build_engine(config).await?;
            print_json(&commands::search(&engine, &user, &query, k).await?)
        }
        Commands::Read { user, from, to } => {
            let engine = runtime::build_engine(config).await?;
            print_json(&commands::read(&engine, &user, from, to).await?)
        }
        Commands::Recent { user, limit, page } => {
            let engine = runtime::build_engine(config).await?;
            print_json(&commands::recent(&engine, &user, limit, page).await?)
        }
        Commands::Doctor { plain } => doctor::run_doctor(config, plain).await,
        Commands::Config => {
            let rendered = memohome_config::render_toml(config)
                .map_err(|e| MemohomeError::Internal(format!("failed to render config: {e}")))?;
            print!("{rendered}");
            Ok(())
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("memohome={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc can advance the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_all_flags() {
        let cli = Cli::try_parse_from([
            "memohome",
            "add",
            "--user",
            "u1",
            "--file",
            "chat.json",
            "--timestamp",
            "2024-01-01T00:00:00Z",
            "--idempotency-key",
            "run-42",
        ])
        .unwrap();
        match cli.command {
            Commands::Add {
                user,
                file,
                timestamp,
                idempotency_key,
            } => {
                assert_eq!(user, "u1");
                assert_eq!(file, PathBuf::from("chat.json"));
                assert_eq!(timestamp, parse_timestamp("2024-01-01T00:00:00Z").ok());
                assert_eq!(idempotency_key.as_deref(), Some("run-42"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_search_with_k_and_global_config() {
        let cli = Cli::try_parse_from([
            "memohome",
            "search",
            "travel plans",
            "--user",
            "u1",
            "-k",
            "3",
            "--config",
            "/etc/memohome/alt.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/memohome/alt.toml")));
        match cli.command {
            Commands::Search { query, user, k } => {
                assert_eq!(query, "travel plans");
                assert_eq!(user, "u1");
                assert_eq!(k, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn recent_defaults_to_first_page_of_ten() {
        let cli = Cli::try_parse_from(["memohome", "recent", "--user", "u1"]).unwrap();
        match cli.command {
            Commands::Recent { limit, page, .. } => {
                assert_eq!(limit, 10);
                assert_eq!(page, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn read_rejects_non_rfc3339_bounds() {
        let result = Cli::try_parse_from([
            "memohome", "read", "--user", "u1", "--from", "last week", "--to",
            "2024-01-01T00:00:00Z",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn default_config_renders_as_toml() {
        let config = MemohomeConfig::default();
        let rendered = memohome_config::render_toml(&config).unwrap();
        assert!(rendered.contains("[memory]"));
        assert!(rendered.contains("default_top_k = 5"));
    }

    #[tokio::test]
    async fn config_command_succeeds_with_defaults() {
        run(Commands::Config, &MemohomeConfig::default())
            .await
            .unwrap();
    }
}
