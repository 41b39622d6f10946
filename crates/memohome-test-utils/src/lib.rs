// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for memohome integration tests.
//!
//! Provides mock model capabilities for fast, deterministic, CI-runnable
//! tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock chat-completion provider with scripted replies
//! - [`MockEmbedder`] - Mock embedding model with keyword-scripted vectors

pub mod mock_embedder;
pub mod mock_provider;

pub use mock_embedder::MockEmbedder;
pub use mock_provider::{MockProvider, MockReply};
