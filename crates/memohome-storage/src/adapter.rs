// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the MemoryStore trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use memohome_config::model::StorageConfig;
use memohome_core::{
    AdapterType, HealthStatus, InsertOutcome, MemohomeError, MemoryStore, MemoryUnit,
    NewMemoryRecord, PluginAdapter, ScoredUnit, SimilarityMetric,
};

use crate::database::{Database, map_tr_err};
use crate::queries::memory_units as units;

/// SQLite-backed memory store.
///
/// Nearest-neighbor search is an exact scan over the owner's vectors: the
/// embeddings are loaded without unit bodies, scored in memory, and only the
/// top `k` units are fetched in full.
pub struct SqliteMemoryStore {
    db: Database,
    metric: SimilarityMetric,
}

impl SqliteMemoryStore {
    /// Wrap an already opened database.
    pub fn new(db: Database, metric: SimilarityMetric) -> Self {
        Self { db, metric }
    }

    /// Open the database described by `config` and wrap it.
    pub async fn open(
        config: &StorageConfig,
        metric: SimilarityMetric,
    ) -> Result<Self, MemohomeError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, %metric, "SQLite memory store opened");
        Ok(Self::new(db, metric))
    }

    /// Open a store over a fresh in-memory database.
    pub async fn in_memory(metric: SimilarityMetric) -> Result<Self, MemohomeError> {
        Ok(Self::new(Database::open_in_memory().await?, metric))
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }
}

#[async_trait]
impl PluginAdapter for SqliteMemoryStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MemohomeError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MemohomeError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn insert(&self, record: &NewMemoryRecord) -> Result<InsertOutcome, MemohomeError> {
        let id = uuid::Uuid::new_v4().to_string();
        let outcome = units::insert_unit(&self.db, id, record).await?;
        debug!(owner = %record.user, id = outcome.id(), ?outcome, "memory unit insert");
        Ok(outcome)
    }

    async fn get(&self, owner: &str, id: &str) -> Result<Option<MemoryUnit>, MemohomeError> {
        units::get_unit(&self.db, owner, id).await
    }

    async fn find_by_idempotency_key(
        &self,
        owner: &str,
        key: &str,
    ) -> Result<Option<MemoryUnit>, MemohomeError> {
        units::get_unit_by_idempotency_key(&self.db, owner, key).await
    }

    async fn range_query(
        &self,
        owner: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MemoryUnit>, MemohomeError> {
        units::units_in_range(&self.db, owner, ceil_millis(from), to.timestamp_millis()).await
    }

    async fn nearest_neighbors(
        &self,
        owner: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredUnit>, MemohomeError> {
        if k == 0 {
            return Ok(vec![]);
        }

        let candidates = units::owner_embeddings(&self.db, owner).await?;
        let scanned = candidates.len();

        let mut ranked = Vec::with_capacity(candidates.len());
        for row in candidates {
            let score = self.metric.score(query, &row.embedding)?;
            ranked.push((score, row.timestamp_ms, row.seq, row.id));
        }
        // Highest score first; ties go to the newer unit, then the later insert.
        ranked.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| b.2.cmp(&a.2))
        });
        ranked.truncate(k);

        let ids: Vec<String> = ranked.iter().map(|(_, _, _, id)| id.clone()).collect();
        let mut by_id: HashMap<String, MemoryUnit> = units::units_by_ids(&self.db, owner, &ids)
            .await?
            .into_iter()
            .map(|unit| (unit.id.clone(), unit))
            .collect();

        let results: Vec<ScoredUnit> = ranked
            .into_iter()
            .filter_map(|(score, _, _, id)| by_id.remove(&id).map(|unit| ScoredUnit { unit, score }))
            .collect();

        debug!(owner, k, scanned, returned = results.len(), "nearest neighbor scan");
        Ok(results)
    }

    async fn list_recent(
        &self,
        owner: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MemoryUnit>, MemohomeError> {
        units::recent_units(&self.db, owner, limit, offset).await
    }

    async fn count(&self, owner: &str) -> Result<usize, MemohomeError> {
        units::count_units(&self.db, owner).await
    }
}

/// Milliseconds since the epoch, rounded up when `at` has a sub-millisecond
/// remainder. Timestamps are stored truncated to the millisecond, so an
/// inclusive lower bound must round up to exclude units before it.
fn ceil_millis(at: DateTime<Utc>) -> i64 {
    let ms = at.timestamp_millis();
    if at.timestamp_subsec_nanos() % 1_000_000 == 0 {
        ms
    } else {
        ms + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memohome_core::ChatMessage;
    use tempfile::tempdir;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap()
    }

    fn record(owner: &str, ms: i64, summary: &str, embedding: Vec<f32>) -> NewMemoryRecord {
        NewMemoryRecord {
            user: owner.into(),
            messages: vec![ChatMessage::user(summary)],
            timestamp: at(ms),
            summary: summary.into(),
            facts: vec![],
            embedding,
            idempotency_key: None,
        }
    }

    async fn store() -> SqliteMemoryStore {
        SqliteMemoryStore::in_memory(SimilarityMetric::Cosine)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn sqlite_store_implements_plugin_adapter() {
        let store = store().await;
        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Storage);
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn open_uses_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("store.db");
        let config = StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let store = SqliteMemoryStore::open(&config, SimilarityMetric::Dot)
            .await
            .unwrap();
        assert!(db_path.exists());
        assert_eq!(store.metric(), SimilarityMetric::Dot);
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn insert_assigns_uuid_ids() {
        let store = store().await;
        let a = store.insert(&record("u1", 0, "a", vec![1.0, 0.0])).await.unwrap();
        let b = store.insert(&record("u1", 0, "a", vec![1.0, 0.0])).await.unwrap();
        assert_ne!(a.id(), b.id());
        assert!(uuid::Uuid::parse_str(a.id()).is_ok());
        assert_eq!(store.count("u1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn nearest_neighbors_ranks_by_similarity() {
        let store = store().await;
        store.insert(&record("u1", 10, "east", vec![1.0, 0.0])).await.unwrap();
        store.insert(&record("u1", 20, "north", vec![0.0, 1.0])).await.unwrap();
        store.insert(&record("u1", 30, "north-east", vec![1.0, 1.0])).await.unwrap();

        let hits = store.nearest_neighbors("u1", &[0.9, 0.1], 3).await.unwrap();
        let summaries: Vec<&str> = hits.iter().map(|h| h.unit.summary.as_str()).collect();
        assert_eq!(summaries, vec!["east", "north-east", "north"]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn nearest_neighbors_breaks_ties_by_recency() {
        let store = store().await;
        store.insert(&record("u1", 100, "older", vec![1.0, 0.0])).await.unwrap();
        store.insert(&record("u1", 200, "newer", vec![2.0, 0.0])).await.unwrap();
        store.insert(&record("u1", 200, "newer-later", vec![3.0, 0.0])).await.unwrap();

        let hits = store.nearest_neighbors("u1", &[1.0, 0.0], 3).await.unwrap();
        let summaries: Vec<&str> = hits.iter().map(|h| h.unit.summary.as_str()).collect();
        assert_eq!(summaries, vec!["newer-later", "newer", "older"]);
    }

    #[tokio::test]
    async fn nearest_neighbors_respects_k() {
        let store = store().await;
        for i in 0..4 {
            store
                .insert(&record("u1", i, "x", vec![1.0, i as f32]))
                .await
                .unwrap();
        }
        assert_eq!(store.nearest_neighbors("u1", &[1.0, 0.0], 2).await.unwrap().len(), 2);
        assert_eq!(store.nearest_neighbors("u1", &[1.0, 0.0], 10).await.unwrap().len(), 4);
        assert!(store.nearest_neighbors("u1", &[1.0, 0.0], 0).await.unwrap().is_empty());
        assert!(store.nearest_neighbors("u9", &[1.0, 0.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn nearest_neighbors_is_owner_isolated() {
        let store = store().await;
        store.insert(&record("u1", 0, "mine", vec![1.0, 0.0])).await.unwrap();
        store.insert(&record("u2", 0, "theirs", vec![1.0, 0.0])).await.unwrap();

        let hits = store.nearest_neighbors("u1", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits.iter().all(|h| h.unit.user == "u1"));
    }

    #[tokio::test]
    async fn nearest_neighbors_rejects_dimension_mismatch() {
        let store = store().await;
        store.insert(&record("u1", 0, "old model", vec![1.0, 0.0])).await.unwrap();

        let err = store
            .nearest_neighbors("u1", &[1.0, 0.0, 0.0], 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MemohomeError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn range_query_converts_bounds_to_millis() {
        let store = store().await;
        store.insert(&record("u1", 1_000, "in", vec![1.0])).await.unwrap();
        store.insert(&record("u1", 2_001, "out", vec![1.0])).await.unwrap();

        let units = store.range_query("u1", at(1_000), at(2_000)).await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].summary, "in");
        assert!(store.range_query("u1", at(5_000), at(6_000)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn range_query_excludes_units_before_sub_millisecond_start() {
        let store = store().await;
        store.insert(&record("u1", 1_000, "before", vec![1.0])).await.unwrap();
        store.insert(&record("u1", 1_001, "after", vec![1.0])).await.unwrap();

        let from = at(1_000) + chrono::Duration::microseconds(500);
        let units = store.range_query("u1", from, at(2_000)).await.unwrap();
        let summaries: Vec<&str> = units.iter().map(|u| u.summary.as_str()).collect();
        assert_eq!(summaries, vec!["after"]);
    }

    #[tokio::test]
    async fn range_query_end_bound_rounds_down() {
        let store = store().await;
        store.insert(&record("u1", 2_000, "edge", vec![1.0])).await.unwrap();

        let to = at(2_000) + chrono::Duration::microseconds(999);
        let units = store.range_query("u1", at(1_000), to).await.unwrap();
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn ceil_millis_rounds_only_fractional_millis() {
        assert_eq!(ceil_millis(at(1_000)), 1_000);
        assert_eq!(ceil_millis(at(1_000) + chrono::Duration::nanoseconds(1)), 1_001);
        assert_eq!(ceil_millis(at(-1_000) + chrono::Duration::microseconds(500)), -999);
    }
}
