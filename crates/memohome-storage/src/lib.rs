// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the memohome memory engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and [`SqliteMemoryStore`], the
//! owner-partitioned implementation of [`memohome_core::MemoryStore`].
//!
//! All writes are serialized through `tokio-rusqlite`'s single background
//! thread. The [`Database`] struct is the single writer: query modules accept
//! `&Database` and go through `connection().call()`. Do not open additional
//! connections for writes.

pub mod adapter;
pub mod codec;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteMemoryStore;
pub use database::Database;
