// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory engine: write path (summarize, embed, persist) and read paths
//! (semantic search, time-window reads, paged history).

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use memohome_config::model::MemoryConfig;
use memohome_core::{
    ChatMessage, InsertOutcome, MemohomeError, MemoryHit, MemoryStore, MemoryUnit,
    NewMemoryRecord,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedder::Embedder;
use crate::recording;
use crate::summarizer::Summarizer;

/// Tunables the engine reads on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Results per search when the caller passes no `k`.
    pub default_top_k: usize,
    /// Hits scoring below this are dropped. `None` keeps every ranked hit.
    pub similarity_threshold: Option<f32>,
    /// Character bound of the fallback summary.
    pub fallback_summary_chars: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&MemoryConfig::default())
    }
}

impl From<&MemoryConfig> for EngineSettings {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            default_top_k: config.default_top_k,
            similarity_threshold: config.similarity_threshold.map(|t| t as f32),
            fallback_summary_chars: config.fallback_summary_chars,
        }
    }
}

/// A finished conversation handed to [`MemoryEngine::add_memory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    pub messages: Vec<ChatMessage>,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    /// Retrying an add with the same key returns the unit stored the first time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Orchestrates the summarizer, the embedder and the store.
///
/// The engine holds no per-call state; it is shared behind an `Arc` and every
/// operation may run concurrently.
pub struct MemoryEngine {
    summarizer: Summarizer,
    embedder: Embedder,
    store: Arc<dyn MemoryStore>,
    settings: EngineSettings,
}

impl MemoryEngine {
    pub fn new(
        summarizer: Summarizer,
        embedder: Embedder,
        store: Arc<dyn MemoryStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            summarizer,
            embedder,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Summarize, embed and persist one conversation.
    ///
    /// A summarization failure does not fail the add: the unit is stored with a
    /// truncated `role: content` rendering of the transcript instead. Embedding
    /// and persistence failures surface as `MemoryAddFailed`, except
    /// `DimensionMismatch`, which is returned unchanged.
    pub async fn add_memory(&self, memory: NewMemory) -> Result<MemoryUnit, MemohomeError> {
        let NewMemory {
            messages,
            timestamp,
            user,
            idempotency_key,
        } = memory;

        require_owner(&user)?;
        if messages.is_empty() {
            return Err(MemohomeError::InvalidInput(
                "a memory needs at least one message".into(),
            ));
        }
        if messages.iter().all(|m| m.content.trim().is_empty()) {
            return Err(MemohomeError::InvalidInput(
                "every message in the conversation is blank".into(),
            ));
        }

        if let Some(key) = idempotency_key.as_deref() {
            let existing = self
                .store
                .find_by_idempotency_key(&user, key)
                .await
                .map_err(|e| add_failed("looking up the idempotency key failed", e))?;
            if let Some(unit) = existing {
                debug!(owner = %user, id = %unit.id, key, "idempotent add, returning stored unit");
                return Ok(unit);
            }
        }

        let (summary, facts, fallback) = match self.summarizer.summarize(&messages).await {
            Ok(digest) => (digest.summary, digest.facts, false),
            Err(e @ MemohomeError::SummarizationFailed { .. }) => {
                warn!(owner = %user, error = %e, "summarization failed, storing fallback summary");
                recording::record_summary_fallback();
                let summary = fallback_summary(&messages, self.settings.fallback_summary_chars);
                (summary, Vec::new(), true)
            }
            Err(e) => return Err(e),
        };

        let embedding = match self.embedder.embed(&summary).await {
            Ok(vector) => vector,
            Err(e @ MemohomeError::DimensionMismatch { .. }) => return Err(e),
            Err(e) => return Err(add_failed("embedding the summary failed", e)),
        };

        let record = NewMemoryRecord {
            user,
            messages,
            timestamp: timestamp.trunc_subsecs(3),
            summary,
            facts,
            embedding,
            idempotency_key,
        };

        let outcome = self
            .store
            .insert(&record)
            .await
            .map_err(|e| add_failed("persisting the memory unit failed", e))?;

        match outcome {
            InsertOutcome::Inserted(id) => {
                recording::record_memory_added(fallback);
                info!(owner = %record.user, id = %id, fallback, "memory unit stored");
                Ok(record.into_unit(id))
            }
            InsertOutcome::Existing(id) => {
                // Lost a race with a concurrent add carrying the same key.
                debug!(owner = %record.user, id = %id, "idempotency key already stored");
                self.store
                    .get(&record.user, &id)
                    .await
                    .map_err(|e| add_failed("reading the existing unit failed", e))?
                    .ok_or_else(|| {
                        add_failed(
                            "existing unit disappeared",
                            MemohomeError::Internal(format!("unit {id} not found")),
                        )
                    })
            }
        }
    }

    /// Semantic search over the owner's units, most similar first.
    ///
    /// Returns at most `k` hits (`default_top_k` when `None`). A failing
    /// embedding model is an error, never an empty result.
    pub async fn search_memory(
        &self,
        query: &str,
        owner: &str,
        k: Option<usize>,
    ) -> Result<Vec<MemoryHit>, MemohomeError> {
        require_owner(owner)?;
        if query.trim().is_empty() {
            return Err(MemohomeError::InvalidInput("search query is blank".into()));
        }

        let k = k.unwrap_or(self.settings.default_top_k);
        let vector = self.embedder.embed(query).await?;
        let scored = self.store.nearest_neighbors(owner, &vector, k).await?;

        let hits: Vec<MemoryHit> = scored
            .into_iter()
            .filter(|s| {
                self.settings
                    .similarity_threshold
                    .is_none_or(|threshold| s.score >= threshold)
            })
            .map(MemoryHit::from)
            .collect();

        recording::record_search(hits.len());
        debug!(owner, k, hits = hits.len(), "memory search");
        Ok(hits)
    }

    /// Units of `owner` with `from <= timestamp <= to`, oldest first.
    pub async fn read_by_time_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        owner: &str,
    ) -> Result<Vec<MemoryUnit>, MemohomeError> {
        require_owner(owner)?;
        if from > to {
            return Err(MemohomeError::InvalidInput(format!(
                "time range start {from} is after its end {to}"
            )));
        }
        let units = self.store.range_query(owner, from, to).await?;
        debug!(owner, %from, %to, units = units.len(), "time range read");
        Ok(units)
    }

    /// One page of the owner's history, newest first. `page` starts at 1.
    pub async fn list_recent(
        &self,
        owner: &str,
        limit: usize,
        page: usize,
    ) -> Result<Vec<MemoryUnit>, MemohomeError> {
        require_owner(owner)?;
        if limit == 0 {
            return Err(MemohomeError::InvalidInput("page size must be at least 1".into()));
        }
        if page == 0 {
            return Err(MemohomeError::InvalidInput("pages are numbered from 1".into()));
        }
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| MemohomeError::InvalidInput("page is out of range".into()))?;
        self.store.list_recent(owner, limit, offset).await
    }

    /// Number of units stored for `owner`.
    pub async fn count_memories(&self, owner: &str) -> Result<usize, MemohomeError> {
        require_owner(owner)?;
        self.store.count(owner).await
    }
}

fn require_owner(owner: &str) -> Result<(), MemohomeError> {
    if owner.trim().is_empty() {
        return Err(MemohomeError::InvalidInput("owner must not be blank".into()));
    }
    Ok(())
}

fn add_failed(message: &str, source: MemohomeError) -> MemohomeError {
    MemohomeError::MemoryAddFailed {
        message: message.to_string(),
        source: Box::new(source),
    }
}

/// Raw-text summary used when the summary model is unavailable.
///
/// Non-blank messages rendered as `role: content` lines, cut to at most
/// `max_chars` characters.
pub fn fallback_summary(messages: &[ChatMessage], max_chars: usize) -> String {
    let text = messages
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| format!("{}: {}", m.role, m.content.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}
