// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term conversational memory for memohome.
//!
//! Turns finished conversations into compact, searchable, time-indexed
//! memory units and recalls them on demand.
//!
//! ## Architecture
//!
//! - **Summarizer**: digest + facts from a transcript via a chat-completion model
//! - **Embedder**: fixed-dimension vectors via an embedding model
//! - **MemoryEngine**: `add_memory`, `search_memory`, `read_by_time_range`, `list_recent`
//! - **MemoryHooks**: the callbacks an agent loop binds to
//! - **context**: prompt blocks for recalled memory

pub mod context;
pub mod embedder;
pub mod engine;
pub mod hooks;
pub mod recording;
pub mod summarizer;

pub use context::{format_memory_block, format_timeline_block};
pub use embedder::Embedder;
pub use engine::{EngineSettings, MemoryEngine, NewMemory};
pub use hooks::MemoryHooks;
pub use recording::register_metrics;
pub use summarizer::{Digest, Summarizer};
