// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contract for memory units.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::MemohomeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InsertOutcome, MemoryUnit, NewMemoryRecord, ScoredUnit};

/// Owner-partitioned, append-only collection of memory units.
///
/// Every method takes the owner explicitly; implementations must never return
/// a unit belonging to a different owner.
#[async_trait]
pub trait MemoryStore: PluginAdapter {
    /// Append a unit and return its assigned id.
    ///
    /// Must be safe under concurrent inserts: ids are unique and no write is lost.
    /// When the record carries an idempotency key the owner already used, nothing
    /// is written and the existing id is returned as [`InsertOutcome::Existing`].
    async fn insert(&self, record: &NewMemoryRecord) -> Result<InsertOutcome, MemohomeError>;

    /// Fetch one unit of `owner` by id.
    async fn get(&self, owner: &str, id: &str) -> Result<Option<MemoryUnit>, MemohomeError>;

    /// Fetch the unit `owner` stored under `key`, if any.
    async fn find_by_idempotency_key(
        &self,
        owner: &str,
        key: &str,
    ) -> Result<Option<MemoryUnit>, MemohomeError>;

    /// Units with `from <= timestamp <= to`, ascending by timestamp then insertion order.
    async fn range_query(
        &self,
        owner: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MemoryUnit>, MemohomeError>;

    /// Up to `k` units ranked by similarity to `query` (higher score first).
    ///
    /// Ties are broken by more recent timestamp. Returns fewer than `k` results when
    /// the owner has fewer units. Fails with `DimensionMismatch` if any stored vector
    /// of the owner differs in length from `query`.
    async fn nearest_neighbors(
        &self,
        owner: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredUnit>, MemohomeError>;

    /// Newest-first page of units.
    async fn list_recent(
        &self,
        owner: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MemoryUnit>, MemohomeError>;

    /// Number of units stored for `owner`.
    async fn count(&self, owner: &str) -> Result<usize, MemohomeError>;
}
