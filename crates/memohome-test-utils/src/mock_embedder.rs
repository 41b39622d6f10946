// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding model for deterministic testing.
//!
//! Vectors are scripted by keyword: the first rule whose keyword appears in
//! the text (case-insensitive) decides the vector. Text matching no rule gets
//! a stable hash-derived vector, so identical texts always embed identically.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use memohome_core::MemohomeError;
use memohome_core::traits::adapter::PluginAdapter;
use memohome_core::traits::embedding::EmbeddingAdapter;
use memohome_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

/// A mock embedding adapter with keyword-scripted vectors.
pub struct MockEmbedder {
    dimensions: usize,
    rules: Vec<(String, Vec<f32>)>,
    failing: AtomicBool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    /// Create an embedder producing `dimensions`-length hash vectors.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            rules: Vec::new(),
            failing: AtomicBool::new(false),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return `vector` for any text containing `keyword`.
    ///
    /// The vector is returned as given, even if its length differs from the
    /// configured dimensions, so tests can simulate a misconfigured model.
    pub fn with_rule(mut self, keyword: impl Into<String>, vector: Vec<f32>) -> Self {
        self.rules.push((keyword.into().to_lowercase(), vector));
        self
    }

    /// Sleep for `delay` before answering (use with paused tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map(|(_, vector)| vector.clone())
            .unwrap_or_else(|| hashed_vector(&lowered, self.dimensions))
    }
}

/// Deterministic pseudo-random unit-ish vector derived from an FNV-1a hash of `text`.
fn hashed_vector(text: &str, dimensions: usize) -> Vec<f32> {
    let mut state: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        state ^= u64::from(byte);
        state = state.wrapping_mul(0x0100_0000_01b3);
    }
    (0..dimensions)
        .map(|_| {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            ((state % 2000) as f32 / 1000.0) - 1.0
        })
        .collect()
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MemohomeError> {
        if self.failing.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("mock embedder set to fail".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), MemohomeError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MemohomeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(MemohomeError::Provider {
                message: "mock embedding model unavailable".into(),
                source: None,
            });
        }

        let embeddings: Vec<Vec<f32>> = input.texts.iter().map(|t| self.vector_for(t)).collect();
        let dimensions = embeddings.first().map_or(self.dimensions, Vec::len);
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(text: &str) -> EmbeddingInput {
        EmbeddingInput {
            texts: vec![text.to_string()],
        }
    }

    #[tokio::test]
    async fn rules_match_case_insensitively() {
        let embedder = MockEmbedder::new(3).with_rule("tokyo", vec![1.0, 0.0, 0.0]);
        let out = embedder.embed(input("Booked a flight to TOKYO")).await.unwrap();
        assert_eq!(out.embeddings, vec![vec![1.0, 0.0, 0.0]]);
        assert_eq!(out.dimensions, 3);
    }

    #[tokio::test]
    async fn unmatched_text_gets_stable_hash_vector() {
        let embedder = MockEmbedder::new(8);
        let a = embedder.embed(input("hello")).await.unwrap();
        let b = embedder.embed(input("hello")).await.unwrap();
        let c = embedder.embed(input("goodbye")).await.unwrap();
        assert_eq!(a.embeddings, b.embeddings);
        assert_ne!(a.embeddings, c.embeddings);
        assert_eq!(a.embeddings[0].len(), 8);
        assert!(a.embeddings[0].iter().all(|v| (-1.0..=1.0).contains(v)));
        assert_eq!(embedder.call_count(), 3);
    }

    #[tokio::test]
    async fn failing_embedder_returns_error() {
        let embedder = MockEmbedder::new(4);
        embedder.set_failing(true);
        assert!(embedder.embed(input("x")).await.is_err());
        assert!(matches!(
            embedder.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
        embedder.set_failing(false);
        assert!(embedder.embed(input("x")).await.is_ok());
    }
}
