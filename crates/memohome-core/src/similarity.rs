// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector similarity functions used for nearest-neighbor ranking.

use crate::error::MemohomeError;
use crate::types::SimilarityMetric;

/// Compute cosine similarity between two equal-length vectors.
///
/// Returns 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom > f32::EPSILON {
        (dot / denom).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Dot product of two equal-length vectors.
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

impl SimilarityMetric {
    /// Score `candidate` against `query`, refusing to compare vectors of different length.
    pub fn score(&self, query: &[f32], candidate: &[f32]) -> Result<f32, MemohomeError> {
        if query.len() != candidate.len() {
            return Err(MemohomeError::DimensionMismatch {
                expected: query.len(),
                actual: candidate.len(),
            });
        }
        Ok(match self {
            SimilarityMetric::Cosine => cosine_similarity(query, candidate),
            SimilarityMetric::Dot => dot_product(query, candidate),
        })
    }
}
