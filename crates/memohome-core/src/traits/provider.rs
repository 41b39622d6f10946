// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-completion capability consumed by the summarizer and the agent loop.

use async_trait::async_trait;

use crate::error::MemohomeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for LLM chat-completion providers.
///
/// Any function of shape `(prompt, model) -> text` can sit behind this trait;
/// the summarizer never depends on a concrete provider.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest)
    -> Result<ProviderResponse, MemohomeError>;
}
