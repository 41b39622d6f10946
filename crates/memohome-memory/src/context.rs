// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt blocks that inject recalled memory into an agent's context.

use std::fmt::Write;

use memohome_core::{MemoryHit, MemoryUnit};

/// Render search hits as a `## Relevant Memories` block, one dated bullet per hit.
///
/// Returns `None` when there is nothing to inject.
pub fn format_memory_block(hits: &[MemoryHit]) -> Option<String> {
    if hits.is_empty() {
        return None;
    }

    let mut text = String::from("## Relevant Memories\n");
    for hit in hits {
        let _ = writeln!(text, "- [{}] {}", hit.timestamp.format("%Y-%m-%d"), hit.summary);
    }
    Some(text)
}

/// Render units read from a time window as a `## Conversation History` block.
///
/// Each unit becomes a timestamped section followed by its turns.
pub fn format_timeline_block(units: &[MemoryUnit]) -> Option<String> {
    if units.is_empty() {
        return None;
    }

    let mut text = String::from("## Conversation History\n");
    for unit in units {
        let _ = writeln!(text, "\n### {}", unit.timestamp.format("%Y-%m-%d %H:%M UTC"));
        for message in &unit.messages {
            let _ = writeln!(text, "{}: {}", message.role, message.content);
        }
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use memohome_core::{ChatMessage, NewMemoryRecord};

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    fn hit(summary: &str, ts: &str) -> MemoryHit {
        MemoryHit {
            id: "id".into(),
            summary: summary.into(),
            score: 0.9,
            timestamp: at(ts),
        }
    }

    #[test]
    fn memory_block_header_and_bullets() {
        let block = format_memory_block(&[
            hit("The user booked a flight to Tokyo.", "2024-01-01T10:00:00Z"),
            hit("Discussed the budget for the trip.", "2024-06-01T10:00:00Z"),
        ])
        .unwrap();
        assert!(block.starts_with("## Relevant Memories\n"));
        assert!(block.contains("- [2024-01-01] The user booked a flight to Tokyo.\n"));
        assert!(block.contains("- [2024-06-01] Discussed the budget for the trip.\n"));
    }

    #[test]
    fn empty_inputs_produce_no_block() {
        assert!(format_memory_block(&[]).is_none());
        assert!(format_timeline_block(&[]).is_none());
    }

    #[test]
    fn timeline_block_lists_turns_under_timestamps() {
        let unit = NewMemoryRecord {
            user: "u1".into(),
            messages: vec![
                ChatMessage::user("What's the weather in Tokyo?"),
                ChatMessage::assistant("Sunny, 22°C."),
            ],
            timestamp: at("2024-03-02T09:15:00Z"),
            summary: "s".into(),
            facts: vec![],
            embedding: vec![],
            idempotency_key: None,
        }
        .into_unit("m1".into());

        let block = format_timeline_block(&[unit]).unwrap();
        assert!(block.starts_with("## Conversation History\n"));
        assert!(block.contains("### 2024-03-02 09:15 UTC\n"));
        assert!(block.contains("user: What's the weather in Tokyo?\n"));
        assert!(block.contains("assistant: Sunny, 22°C.\n"));
    }
}
