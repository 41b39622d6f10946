// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory callbacks an agent loop binds to.
//!
//! An agent turn reads context before calling the model (either the recent
//! time window or a semantic search) and hands the finished transcript back
//! when the turn ends.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use memohome_config::model::MemoryConfig;
use memohome_core::{ChatMessage, MemohomeError, MemoryHit, MemoryUnit};

use crate::context::{format_memory_block, format_timeline_block};
use crate::engine::{MemoryEngine, NewMemory};

/// The memory surface of one agent session, bound to a single owner.
#[derive(Clone)]
pub struct MemoryHooks {
    engine: Arc<MemoryEngine>,
    owner: String,
    max_context_load_time: TimeDelta,
}

impl MemoryHooks {
    pub fn new(engine: Arc<MemoryEngine>, owner: impl Into<String>, max_context_load_time: TimeDelta) -> Self {
        Self {
            engine,
            owner: owner.into(),
            max_context_load_time,
        }
    }

    /// Bind with the context window from `max_context_load_minutes`.
    pub fn from_config(
        engine: Arc<MemoryEngine>,
        owner: impl Into<String>,
        config: &MemoryConfig,
    ) -> Self {
        let minutes = i64::try_from(config.max_context_load_minutes).unwrap_or(i64::MAX);
        let window = TimeDelta::try_minutes(minutes).unwrap_or(TimeDelta::MAX);
        Self::new(engine, owner, window)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn max_context_load_time(&self) -> TimeDelta {
        self.max_context_load_time
    }

    /// Time-windowed read for the bound owner.
    pub async fn on_read_memory(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MemoryUnit>, MemohomeError> {
        self.engine.read_by_time_range(from, to, &self.owner).await
    }

    /// Semantic search for the bound owner with the default `k`.
    pub async fn on_search_memory(&self, query: &str) -> Result<Vec<MemoryHit>, MemohomeError> {
        self.engine.search_memory(query, &self.owner, None).await
    }

    /// Store the finished conversation, stamped with the current time.
    pub async fn on_finish(&self, messages: Vec<ChatMessage>) -> Result<MemoryUnit, MemohomeError> {
        self.engine
            .add_memory(NewMemory {
                messages,
                timestamp: Utc::now(),
                user: self.owner.clone(),
                idempotency_key: None,
            })
            .await
    }

    /// History block covering the last `max_context_load_time` before `now`.
    pub async fn recent_context(&self, now: DateTime<Utc>) -> Result<Option<String>, MemohomeError> {
        let from = now
            .checked_sub_signed(self.max_context_load_time)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let units = self.on_read_memory(from, now).await?;
        Ok(format_timeline_block(&units))
    }

    /// Relevant-memories block for `query`.
    pub async fn search_context(&self, query: &str) -> Result<Option<String>, MemohomeError> {
        let hits = self.on_search_memory(query).await?;
        Ok(format_memory_block(&hits))
    }
}
