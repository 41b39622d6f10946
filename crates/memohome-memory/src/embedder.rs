// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-dimension text embedding through an embedding model.

use std::sync::Arc;
use std::time::{Duration, Instant};

use memohome_core::traits::EmbeddingAdapter;
use memohome_core::types::EmbeddingInput;
use memohome_core::MemohomeError;
use tracing::debug;

use crate::recording;

/// Default bound on a single embedding call.
pub const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(30);

/// Converts text into vectors of a dimension fixed at construction.
///
/// Never fabricates a vector: every failure is returned as an error.
pub struct Embedder {
    adapter: Arc<dyn EmbeddingAdapter>,
    dimensions: usize,
    timeout: Duration,
}

impl Embedder {
    pub fn new(adapter: Arc<dyn EmbeddingAdapter>, dimensions: usize) -> Self {
        Self {
            adapter,
            dimensions,
            timeout: DEFAULT_EMBEDDING_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The vector length every successful call returns.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text.
    ///
    /// Blank text is `InvalidInput`. Model failure, timeout, an empty result or
    /// non-finite components are `EmbeddingFailed`. A vector of the wrong length
    /// is `DimensionMismatch`.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, MemohomeError> {
        if text.trim().is_empty() {
            return Err(MemohomeError::InvalidInput("cannot embed blank text".into()));
        }

        let input = EmbeddingInput {
            texts: vec![text.to_string()],
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.adapter.embed(input)).await;
        recording::record_model_call("embed", started.elapsed().as_secs_f64());

        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(MemohomeError::EmbeddingFailed {
                    message: format!("embedding model `{}` failed", self.adapter.name()),
                    source: Some(Box::new(e)),
                });
            }
            Err(_) => {
                return Err(MemohomeError::EmbeddingFailed {
                    message: format!("embedding model `{}` timed out", self.adapter.name()),
                    source: Some(Box::new(MemohomeError::Timeout {
                        duration: self.timeout,
                    })),
                });
            }
        };

        let vector = output
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| MemohomeError::embedding("embedding model returned no vector"))?;

        if vector.len() != self.dimensions {
            return Err(MemohomeError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        if vector.iter().any(|v| !v.is_finite()) {
            return Err(MemohomeError::embedding(
                "embedding model returned non-finite components",
            ));
        }

        debug!(chars = text.len(), dimensions = vector.len(), "text embedded");
        Ok(vector)
    }
}
