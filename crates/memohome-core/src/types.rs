// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the capability traits, the store and the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of capability an adapter provides.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Embedding,
    Storage,
}

// --- Conversation types ---

/// Speaker of a conversational turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

/// A single role-tagged turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

// --- Memory types ---

/// A structured fact extracted alongside a conversation digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryFact {
    /// The fact as a standalone statement.
    pub content: String,
    /// Category: personal, preference, project, decision, commitment, other.
    #[serde(default = "default_fact_category")]
    pub category: String,
}

fn default_fact_category() -> String {
    "other".to_string()
}

/// One persisted conversational episode.
///
/// Units are immutable once stored. Corrections are made by adding a new unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryUnit {
    /// Identifier assigned by the store at persistence time.
    pub id: String,
    /// Owner every query is scoped to.
    pub user: String,
    /// The conversation turns, in their original order.
    pub messages: Vec<ChatMessage>,
    /// When the episode ended.
    pub timestamp: DateTime<Utc>,
    /// Digest produced at write time.
    pub summary: String,
    /// Structured facts extracted with the digest (empty for fallback summaries).
    #[serde(default)]
    pub facts: Vec<MemoryFact>,
    /// Vector computed from the summary. Used only for similarity search.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// Caller-supplied deduplication key, unique per owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// A fully derived unit ready to be persisted. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemoryRecord {
    pub user: String,
    pub messages: Vec<ChatMessage>,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub facts: Vec<MemoryFact>,
    pub embedding: Vec<f32>,
    pub idempotency_key: Option<String>,
}

impl NewMemoryRecord {
    /// Combine this record with the id the store assigned to it.
    pub fn into_unit(self, id: String) -> MemoryUnit {
        MemoryUnit {
            id,
            user: self.user,
            messages: self.messages,
            timestamp: self.timestamp,
            summary: self.summary,
            facts: self.facts,
            embedding: self.embedding,
            idempotency_key: self.idempotency_key,
        }
    }
}

/// Result of a store insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new unit was written with this id.
    Inserted(String),
    /// The owner already holds a unit with the same idempotency key.
    Existing(String),
}

impl InsertOutcome {
    pub fn id(&self) -> &str {
        match self {
            InsertOutcome::Inserted(id) | InsertOutcome::Existing(id) => id,
        }
    }
}

/// A stored unit with its similarity to a query vector.
#[derive(Debug, Clone)]
pub struct ScoredUnit {
    pub unit: MemoryUnit,
    /// Higher is more similar.
    pub score: f32,
}

/// Caller-facing search result. Never carries the embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHit {
    pub id: String,
    pub summary: String,
    pub score: f32,
    pub timestamp: DateTime<Utc>,
}

impl From<ScoredUnit> for MemoryHit {
    fn from(scored: ScoredUnit) -> Self {
        Self {
            id: scored.unit.id,
            summary: scored.unit.summary,
            score: scored.score,
            timestamp: scored.unit.timestamp,
        }
    }
}

/// Similarity metric used for nearest-neighbor ranking.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SimilarityMetric {
    /// Cosine similarity in [-1, 1].
    #[default]
    Cosine,
    /// Raw dot product. Equivalent to cosine for L2-normalized vectors.
    Dot,
}

// --- Provider types ---

/// A chat-completion request.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A chat-completion response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

// --- Embedding types ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter: one vector per input text.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}
