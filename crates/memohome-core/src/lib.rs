// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the memohome memory engine.
//!
//! This crate provides the error type, the memory domain types and the
//! capability traits (chat completion, embedding, persistence) that the
//! engine consumes. Concrete adapters live in their own crates.

pub mod error;
pub mod similarity;
pub mod traits;
pub mod types;

pub use error::MemohomeError;
pub use types::{
    AdapterType, ChatMessage, HealthStatus, InsertOutcome, MemoryFact, MemoryHit, MemoryUnit,
    NewMemoryRecord, Role, ScoredUnit, SimilarityMetric,
};

pub use traits::{EmbeddingAdapter, MemoryStore, PluginAdapter, ProviderAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [AdapterType::Provider, AdapterType::Embedding, AdapterType::Storage] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_capability_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_memory_store<T: MemoryStore>() {}
    }

    #[test]
    fn capability_traits_are_object_safe() {
        fn _takes(
            _p: &dyn ProviderAdapter,
            _e: &dyn EmbeddingAdapter,
            _s: &dyn MemoryStore,
        ) {
        }
    }
}
