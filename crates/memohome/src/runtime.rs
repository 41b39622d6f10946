// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires configuration, storage and model adapters into a [`MemoryEngine`].

use std::sync::Arc;
use std::time::Duration;

use memohome_config::{MemohomeConfig, MemoryConfig};
use memohome_core::{EmbeddingAdapter, MemohomeError, MemoryStore, ProviderAdapter};
use memohome_memory::{Embedder, EngineSettings, MemoryEngine, Summarizer};
use memohome_openai::{OpenAiEmbedder, OpenAiProvider};
use memohome_storage::SqliteMemoryStore;
use tracing::info;

/// Builds the engine described by `config`: OpenAI-compatible models and the
/// SQLite store.
pub async fn build_engine(config: &MemohomeConfig) -> Result<MemoryEngine, MemohomeError> {
    if !config.memory.enabled {
        return Err(MemohomeError::Config(
            "memory is disabled (set [memory] enabled = true)".into(),
        ));
    }

    let summary = config.models.summary_model().ok_or_else(|| {
        MemohomeError::Config(
            "no summary model configured: add [models.summary] or [models.chat]".into(),
        )
    })?;
    let embedding = config.models.embedding.as_ref().ok_or_else(|| {
        MemohomeError::Config("no embedding model configured: add [models.embedding]".into())
    })?;

    let provider = Arc::new(OpenAiProvider::from_config(summary)?);
    let embedder = Arc::new(OpenAiEmbedder::from_config(embedding)?);
    let store =
        Arc::new(SqliteMemoryStore::open(&config.storage, config.memory.similarity_metric).await?);

    info!(
        summary_model = %summary.model_id,
        embedding_model = %embedding.model_id,
        dimensions = embedding.dimensions,
        database = %config.storage.database_path,
        "memory engine ready"
    );

    Ok(assemble(
        &config.memory,
        &summary.model_id,
        embedding.dimensions,
        provider,
        embedder,
        store,
    ))
}

/// Assembles an engine from already constructed capabilities.
pub fn assemble(
    memory: &MemoryConfig,
    summary_model: &str,
    dimensions: usize,
    provider: Arc<dyn ProviderAdapter>,
    embedding: Arc<dyn EmbeddingAdapter>,
    store: Arc<dyn MemoryStore>,
) -> MemoryEngine {
    let summarizer = Summarizer::new(provider, summary_model)
        .with_max_tokens(memory.summary_max_tokens)
        .with_timeout(Duration::from_secs(memory.summarization_timeout_secs));
    let embedder = Embedder::new(embedding, dimensions)
        .with_timeout(Duration::from_secs(memory.embedding_timeout_secs));

    MemoryEngine::new(summarizer, embedder, store, EngineSettings::from(memory))
}
