// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory unit persistence: append, owner-scoped reads and embedding scans.

use memohome_core::{InsertOutcome, MemohomeError, MemoryUnit, NewMemoryRecord};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use crate::codec::{blob_to_vec, json_column, millis_to_timestamp, vec_to_blob};
use crate::database::{Database, map_tr_err};

const UNIT_COLUMNS: &str =
    "id, owner, messages, timestamp_ms, summary, facts, embedding, idempotency_key";

/// Ids bound per `IN (...)` query in [`units_by_ids`].
const IDS_PER_QUERY: usize = 500;

/// Lightweight row used for similarity scans: everything but the unit body.
#[derive(Debug, Clone)]
pub struct EmbeddingRow {
    pub seq: i64,
    pub id: String,
    pub timestamp_ms: i64,
    pub embedding: Vec<f32>,
}

/// Insert a unit under `id`, or return the id already stored under the record's
/// idempotency key.
///
/// The lookup and the insert run in one transaction on the writer thread, so
/// two concurrent inserts with the same key cannot both write.
pub async fn insert_unit(
    db: &Database,
    id: String,
    record: &NewMemoryRecord,
) -> Result<InsertOutcome, MemohomeError> {
    let owner = record.user.clone();
    let messages = serde_json::to_string(&record.messages).map_err(MemohomeError::storage)?;
    let facts = serde_json::to_string(&record.facts).map_err(MemohomeError::storage)?;
    let timestamp_ms = record.timestamp.timestamp_millis();
    let summary = record.summary.clone();
    let embedding = vec_to_blob(&record.embedding);
    let dimensions = record.embedding.len() as i64;
    let idempotency_key = record.idempotency_key.clone();

    db.connection()
        .call(move |conn| -> Result<InsertOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;

            if let Some(key) = &idempotency_key {
                let existing: Option<String> = tx
                    .query_row(
                        "SELECT id FROM memory_units WHERE owner = ?1 AND idempotency_key = ?2",
                        params![owner, key],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(existing) = existing {
                    return Ok(InsertOutcome::Existing(existing));
                }
            }

            tx.execute(
                "INSERT INTO memory_units
                    (id, owner, messages, timestamp_ms, summary, facts, embedding, dimensions, idempotency_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id,
                    owner,
                    messages,
                    timestamp_ms,
                    summary,
                    facts,
                    embedding,
                    dimensions,
                    idempotency_key,
                ],
            )?;
            tx.commit()?;
            Ok(InsertOutcome::Inserted(id))
        })
        .await
        .map_err(map_tr_err)
}

/// Get one unit of `owner` by id.
pub async fn get_unit(
    db: &Database,
    owner: &str,
    id: &str,
) -> Result<Option<MemoryUnit>, MemohomeError> {
    let owner = owner.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<MemoryUnit>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {UNIT_COLUMNS} FROM memory_units WHERE owner = ?1 AND id = ?2"),
                params![owner, id],
                row_to_unit,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Get the unit `owner` stored under an idempotency key.
pub async fn get_unit_by_idempotency_key(
    db: &Database,
    owner: &str,
    key: &str,
) -> Result<Option<MemoryUnit>, MemohomeError> {
    let owner = owner.to_string();
    let key = key.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<MemoryUnit>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {UNIT_COLUMNS} FROM memory_units WHERE owner = ?1 AND idempotency_key = ?2"
                ),
                params![owner, key],
                row_to_unit,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Units of `owner` with `from_ms <= timestamp_ms <= to_ms`, oldest first,
/// ties in insertion order.
pub async fn units_in_range(
    db: &Database,
    owner: &str,
    from_ms: i64,
    to_ms: i64,
) -> Result<Vec<MemoryUnit>, MemohomeError> {
    let owner = owner.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<MemoryUnit>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {UNIT_COLUMNS} FROM memory_units
                 WHERE owner = ?1 AND timestamp_ms >= ?2 AND timestamp_ms <= ?3
                 ORDER BY timestamp_ms ASC, seq ASC"
            ))?;
            stmt.query_map(params![owner, from_ms, to_ms], row_to_unit)?
                .collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Every embedding stored for `owner`, without the unit bodies.
pub async fn owner_embeddings(
    db: &Database,
    owner: &str,
) -> Result<Vec<EmbeddingRow>, MemohomeError> {
    let owner = owner.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<EmbeddingRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT seq, id, timestamp_ms, embedding FROM memory_units WHERE owner = ?1",
            )?;
            stmt.query_map(params![owner], |row| {
                let blob: Vec<u8> = row.get(3)?;
                Ok(EmbeddingRow {
                    seq: row.get(0)?,
                    id: row.get(1)?,
                    timestamp_ms: row.get(2)?,
                    embedding: blob_to_vec(&blob),
                })
            })?
            .collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Batch fetch units of `owner` by id. Order of the result is unspecified.
///
/// Ids are bound in chunks of [`IDS_PER_QUERY`] so any number of ids stays
/// under SQLite's host parameter limit.
pub async fn units_by_ids(
    db: &Database,
    owner: &str,
    ids: &[String],
) -> Result<Vec<MemoryUnit>, MemohomeError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let owner = owner.to_string();
    let ids = ids.to_vec();

    db.connection()
        .call(move |conn| -> Result<Vec<MemoryUnit>, rusqlite::Error> {
            let mut units = Vec::with_capacity(ids.len());
            for chunk in ids.chunks(IDS_PER_QUERY) {
                let placeholders: Vec<String> =
                    (2..=chunk.len() + 1).map(|i| format!("?{i}")).collect();
                let sql = format!(
                    "SELECT {UNIT_COLUMNS} FROM memory_units WHERE owner = ?1 AND id IN ({})",
                    placeholders.join(", ")
                );
                let mut stmt = conn.prepare(&sql)?;
                let bind = std::iter::once(&owner).chain(chunk.iter());
                for unit in stmt.query_map(params_from_iter(bind), row_to_unit)? {
                    units.push(unit?);
                }
            }
            Ok(units)
        })
        .await
        .map_err(map_tr_err)
}

/// Newest-first page of units of `owner`.
pub async fn recent_units(
    db: &Database,
    owner: &str,
    limit: usize,
    offset: usize,
) -> Result<Vec<MemoryUnit>, MemohomeError> {
    let owner = owner.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<MemoryUnit>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {UNIT_COLUMNS} FROM memory_units
                 WHERE owner = ?1
                 ORDER BY timestamp_ms DESC, seq DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            stmt.query_map(params![owner, limit, offset], row_to_unit)?
                .collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of units stored for `owner`.
pub async fn count_units(db: &Database, owner: &str) -> Result<usize, MemohomeError> {
    let owner = owner.to_string();
    let count = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM memory_units WHERE owner = ?1",
                params![owner],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// Map a row selected with [`UNIT_COLUMNS`] to a unit.
fn row_to_unit(row: &Row<'_>) -> Result<MemoryUnit, rusqlite::Error> {
    let messages: String = row.get(2)?;
    let timestamp_ms: i64 = row.get(3)?;
    let facts: String = row.get(5)?;
    let embedding: Vec<u8> = row.get(6)?;

    Ok(MemoryUnit {
        id: row.get(0)?,
        user: row.get(1)?,
        messages: json_column(2, &messages)?,
        timestamp: millis_to_timestamp(3, timestamp_ms)?,
        summary: row.get(4)?,
        facts: json_column(5, &facts)?,
        embedding: blob_to_vec(&embedding),
        idempotency_key: row.get(7)?,
    })
}
