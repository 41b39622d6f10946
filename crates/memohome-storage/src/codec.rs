// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversions between memory types and their SQLite column encodings.
//!
//! Embeddings are little-endian f32 BLOBs; messages and facts are JSON text;
//! timestamps are integer milliseconds since the Unix epoch.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

/// Convert an f32 vector to a little-endian BLOB.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a little-endian BLOB back to an f32 vector.
///
/// Trailing bytes that do not form a whole f32 are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

pub fn timestamp_to_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// Decode a millisecond timestamp read from column `idx`.
pub fn millis_to_timestamp(idx: usize, ms: i64) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::from_timestamp_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

/// Decode a JSON text column into `T`, reporting failures as a column conversion error.
pub fn json_column<T: serde::de::DeserializeOwned>(
    idx: usize,
    text: &str,
) -> Result<T, rusqlite::Error> {
    serde_json::from_str(text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
