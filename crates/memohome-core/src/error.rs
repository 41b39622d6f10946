// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the memohome memory engine.

use thiserror::Error;

/// Boxed error source carried by wrapping variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all memohome capability traits and engine operations.
#[derive(Debug, Error)]
pub enum MemohomeError {
    /// Malformed or empty arguments (empty messages, empty query, blank owner).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The chat-completion call behind the summarizer failed or returned nothing usable.
    #[error("summarization failed: {message}")]
    SummarizationFailed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The embedding call failed. No fallback vector is ever produced.
    #[error("embedding failed: {message}")]
    EmbeddingFailed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Query and stored vectors differ in length (embedding model changed without re-indexing).
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Adding a memory failed after validation (embedding or persistence).
    #[error("failed to add memory: {message}")]
    MemoryAddFailed {
        message: String,
        #[source]
        source: BoxError,
    },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage { source: BoxError },

    /// Model provider errors (HTTP failure, bad status, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<BoxError>,
    },

    /// Configuration errors (missing model settings, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MemohomeError {
    /// Shorthand for a summarization failure without an underlying cause.
    pub fn summarization(message: impl Into<String>) -> Self {
        Self::SummarizationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for an embedding failure without an underlying cause.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// True for errors that indicate a misconfigured deployment rather than a transient fault.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. } | Self::Config(_))
    }
}
