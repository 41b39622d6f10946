// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memohome add | search | read | recent` command implementations.
//!
//! Each command returns serializable data; `main` prints it as JSON on stdout.

use std::path::Path;

use chrono::{DateTime, Utc};
use memohome_core::{ChatMessage, MemohomeError, MemoryHit, MemoryUnit};
use memohome_memory::{MemoryEngine, NewMemory};
use serde::{Deserialize, Serialize};

/// Accepted transcript file layouts: a bare message array, or an object
/// with `messages` and an optional `timestamp`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Messages(Vec<ChatMessage>),
    Document {
        messages: Vec<ChatMessage>,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
}

/// A transcript read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub messages: Vec<ChatMessage>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Transcript {
    pub fn parse(json: &str) -> Result<Self, MemohomeError> {
        let file: TranscriptFile = serde_json::from_str(json).map_err(|e| {
            MemohomeError::InvalidInput(format!("transcript is not valid JSON: {e}"))
        })?;
        Ok(match file {
            TranscriptFile::Messages(messages) => Self {
                messages,
                timestamp: None,
            },
            TranscriptFile::Document {
                messages,
                timestamp,
            } => Self {
                messages,
                timestamp,
            },
        })
    }

    pub async fn read(path: &Path) -> Result<Self, MemohomeError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            MemohomeError::InvalidInput(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&json)
    }
}

/// Parses an RFC 3339 timestamp argument.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp such as 2024-06-01T12:00:00Z: {e}"))
}

/// Stores a transcript. The `--timestamp` flag wins over one in the file;
/// with neither, the current time is used.
pub async fn add(
    engine: &MemoryEngine,
    user: &str,
    transcript: Transcript,
    timestamp: Option<DateTime<Utc>>,
    idempotency_key: Option<String>,
) -> Result<MemoryUnit, MemohomeError> {
    let timestamp = timestamp.or(transcript.timestamp).unwrap_or_else(Utc::now);
    engine
        .add_memory(NewMemory {
            messages: transcript.messages,
            timestamp,
            user: user.to_string(),
            idempotency_key,
        })
        .await
}

pub async fn search(
    engine: &MemoryEngine,
    user: &str,
    query: &str,
    k: Option<usize>,
) -> Result<Vec<MemoryHit>, MemohomeError> {
    engine.search_memory(query, user, k).await
}

pub async fn read(
    engine: &MemoryEngine,
    user: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<MemoryUnit>, MemohomeError> {
    engine.read_by_time_range(from, to, user).await
}

/// One page of recent history together with the owner's total.
#[derive(Debug, Serialize)]
pub struct RecentPage {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub units: Vec<MemoryUnit>,
}

pub async fn recent(
    engine: &MemoryEngine,
    user: &str,
    limit: usize,
    page: usize,
) -> Result<RecentPage, MemohomeError> {
    let units = engine.list_recent(user, limit, page).await?;
    let total = engine.count_memories(user).await?;
    Ok(RecentPage {
        page,
        limit,
        total,
        units,
    })
}

/// Writes `value` as pretty JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), MemohomeError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| MemohomeError::Internal(format!("failed to encode output: {e}")))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::assemble;
    use memohome_config::MemoryConfig;
    use memohome_core::{Role, SimilarityMetric};
    use memohome_storage::SqliteMemoryStore;
    use memohome_test_utils::{MockEmbedder, MockProvider};
    use std::sync::Arc;

    async fn engine(replies: Vec<&str>) -> MemoryEngine {
        let provider = MockProvider::with_responses(replies.into_iter().map(String::from).collect());
        let embedder = MockEmbedder::new(4)
            .with_rule("tokyo", vec![1.0, 0.0, 0.0, 0.0])
            .with_rule("travel", vec![0.9, 0.1, 0.0, 0.0])
            .with_rule("budget", vec![0.0, 1.0, 0.0, 0.0]);
        let store = SqliteMemoryStore::in_memory(SimilarityMetric::Cosine)
            .await
            .unwrap();
        assemble(
            &MemoryConfig::default(),
            "summary-model",
            4,
            Arc::new(provider),
            Arc::new(embedder),
            Arc::new(store),
        )
    }

    fn ts(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn parses_bare_message_array() {
        let t = Transcript::parse(
            r#"[{"role":"user","content":"I booked a flight to Tokyo"},
                {"role":"assistant","content":"Great, when do you leave?"}]"#,
        )
        .unwrap();
        assert_eq!(t.messages.len(), 2);
        assert_eq!(t.messages[1].role, Role::Assistant);
        assert!(t.timestamp.is_none());
    }

    #[test]
    fn parses_document_with_timestamp() {
        let t = Transcript::parse(
            r#"{"timestamp":"2024-01-01T00:00:00Z",
                "messages":[{"role":"user","content":"hello"}]}"#,
        )
        .unwrap();
        assert_eq!(t.timestamp, Some(ts("2024-01-01T00:00:00Z")));
    }

    #[test]
    fn rejects_malformed_transcript() {
        let err = Transcript::parse(r#"{"turns": []}"#).unwrap_err();
        assert!(matches!(err, MemohomeError::InvalidInput(_)));
    }

    #[test]
    fn timestamp_offsets_are_normalized_to_utc() {
        assert_eq!(ts("2024-06-01T14:00:00+02:00"), ts("2024-06-01T12:00:00Z"));
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn read_missing_file_is_invalid_input() {
        let err = Transcript::read(Path::new("/nonexistent/memohome/transcript.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, MemohomeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn add_prefers_flag_timestamp_over_file() {
        let engine = engine(vec![r#"{"summary":"User booked a flight to Tokyo.","facts":[]}"#]).await;
        let transcript = Transcript {
            messages: vec![ChatMessage::user("I booked a flight to Tokyo")],
            timestamp: Some(ts("2023-01-01T00:00:00Z")),
        };
        let unit = add(&engine, "u1", transcript, Some(ts("2024-01-01T00:00:00Z")), None)
            .await
            .unwrap();
        assert_eq!(unit.timestamp, ts("2024-01-01T00:00:00Z"));
        assert_eq!(unit.summary, "User booked a flight to Tokyo.");
    }

    #[tokio::test]
    async fn add_then_search_read_and_recent() {
        let engine = engine(vec![
            r#"{"summary":"Trip to Tokyo booked for March.","facts":[]}"#,
            r#"{"summary":"Discussed the monthly budget.","facts":[]}"#,
        ])
        .await;

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{"timestamp":"2024-01-01T00:00:00Z","messages":[{"role":"user","content":"Book Tokyo in March"}]}"#,
        )
        .unwrap();
        let transcript = Transcript::read(file.path()).await.unwrap();
        let first = add(&engine, "u1", transcript, None, Some("k1".into()))
            .await
            .unwrap();

        let second = add(
            &engine,
            "u1",
            Transcript {
                messages: vec![ChatMessage::user("Let's plan the budget")],
                timestamp: None,
            },
            Some(ts("2024-06-01T00:00:00Z")),
            None,
        )
        .await
        .unwrap();

        let hits = search(&engine, "u1", "travel plans", Some(1)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, first.id);

        let units = read(
            &engine,
            "u1",
            ts("2024-01-01T00:00:00Z"),
            ts("2024-06-01T00:00:00Z"),
        )
        .await
        .unwrap();
        let ids: Vec<_> = units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);

        let page = recent(&engine, "u1", 1, 1).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.units.len(), 1);
        assert_eq!(page.units[0].id, second.id);

        let json = serde_json::to_value(&page).unwrap();
        assert!(json["units"][0].get("embedding").is_none());
    }

    #[tokio::test]
    async fn search_for_other_user_is_empty() {
        let engine = engine(vec![r#"{"summary":"Trip to Tokyo.","facts":[]}"#]).await;
        add(
            &engine,
            "u1",
            Transcript {
                messages: vec![ChatMessage::user("Tokyo")],
                timestamp: None,
            },
            None,
            None,
        )
        .await
        .unwrap();
        assert!(search(&engine, "u2", "tokyo", None).await.unwrap().is_empty());
    }
}
