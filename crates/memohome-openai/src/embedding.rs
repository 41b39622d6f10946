// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter over the OpenAI-compatible `/embeddings` endpoint.

use async_trait::async_trait;
use memohome_config::EmbeddingModelConfig;
use memohome_core::traits::EmbeddingAdapter;
use memohome_core::types::{EmbeddingInput, EmbeddingOutput};
use memohome_core::{AdapterType, HealthStatus, MemohomeError, PluginAdapter};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::EmbeddingRequest;

/// Embedding model reached over HTTP.
///
/// Vectors are returned in input order regardless of the order the server
/// lists them in.
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
    dimensions: usize,
    name: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder from a configured embedding model.
    pub fn from_config(config: &EmbeddingModelConfig) -> Result<Self, MemohomeError> {
        let client = OpenAiClient::new(&config.base_url, config.api_key.as_deref())?;
        info!(
            model = %config.model_id,
            dimensions = config.dimensions,
            "OpenAI-compatible embedder initialized"
        );
        Ok(Self {
            client,
            model: config.model_id.clone(),
            dimensions: config.dimensions,
            name: config
                .name
                .clone()
                .unwrap_or_else(|| config.model_id.clone()),
        })
    }

    /// The vector length this model is configured to produce.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl PluginAdapter for OpenAiEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MemohomeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MemohomeError> {
        debug!(embedder = %self.name, "OpenAI-compatible embedder shutting down");
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MemohomeError> {
        if input.texts.is_empty() {
            return Ok(EmbeddingOutput {
                embeddings: vec![],
                dimensions: self.dimensions,
            });
        }

        let expected = input.texts.len();
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: input.texts,
            encoding_format: "float",
        };
        let mut response = self.client.embeddings(&request).await?;

        if response.data.len() != expected {
            return Err(MemohomeError::Provider {
                message: format!(
                    "expected {expected} embeddings, server returned {}",
                    response.data.len()
                ),
                source: None,
            });
        }

        response.data.sort_by_key(|d| d.index);
        let embeddings: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        let dimensions = embeddings.first().map_or(self.dimensions, Vec::len);

        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}
