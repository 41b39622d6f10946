// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible model adapters for memohome.
//!
//! [`OpenAiProvider`] implements [`ProviderAdapter`] over `/chat/completions`
//! and [`OpenAiEmbedder`] implements
//! [`EmbeddingAdapter`](memohome_core::traits::EmbeddingAdapter) over
//! `/embeddings`. Any server speaking the same protocol works, including
//! local ones that need no API key.

pub mod client;
pub mod embedding;
pub mod types;

use async_trait::async_trait;
use memohome_config::ChatModelConfig;
use memohome_core::types::{ProviderRequest, ProviderResponse, TokenUsage};
use memohome_core::{AdapterType, HealthStatus, MemohomeError, PluginAdapter, ProviderAdapter};
use tracing::{debug, info};

pub use client::OpenAiClient;
pub use embedding::OpenAiEmbedder;

use crate::types::{ApiMessage, ChatCompletionRequest};

/// Chat-completion provider backed by an OpenAI-compatible endpoint.
pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
    name: String,
}

impl OpenAiProvider {
    /// Creates a provider from a configured chat model.
    pub fn from_config(config: &ChatModelConfig) -> Result<Self, MemohomeError> {
        let client = OpenAiClient::new(&config.base_url, config.api_key.as_deref())?;
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| config.model_id.clone());

        info!(model = %config.model_id, base_url = %config.base_url, "OpenAI-compatible provider initialized");

        Ok(Self {
            client,
            model: config.model_id.clone(),
            name,
        })
    }

    /// Creates a provider around an existing client.
    pub fn with_client(client: OpenAiClient, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            client,
            name: model.clone(),
            model,
        }
    }

    /// The model used when a request leaves `model` empty.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_chat_request(&self, request: &ProviderRequest) -> ChatCompletionRequest {
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system_prompt {
            messages.push(ApiMessage {
                role: "system".into(),
                content: Some(system.clone()),
            });
        }
        messages.extend(request.messages.iter().map(|m| ApiMessage {
            role: m.role.to_string(),
            content: Some(m.content.clone()),
        }));

        ChatCompletionRequest {
            model,
            messages,
            max_tokens: (request.max_tokens > 0).then_some(request.max_tokens),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MemohomeError> {
        // Completions cost tokens, so the check only confirms the client was built.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MemohomeError> {
        debug!(provider = %self.name, "OpenAI-compatible provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, MemohomeError> {
        let api_request = self.to_chat_request(&request);
        let response = self.client.chat_completion(&api_request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MemohomeError::Provider {
                message: "response contained no choices".into(),
                source: None,
            })?;

        let model = if response.model.is_empty() {
            api_request.model
        } else {
            response.model
        };

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            model,
            usage: response.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memohome_core::ChatMessage;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> ChatModelConfig {
        ChatModelConfig {
            model_id: "gpt-4o-mini".into(),
            base_url: base_url.into(),
            api_key: Some("sk-test".into()),
            name: None,
        }
    }

    fn request(model: &str) -> ProviderRequest {
        ProviderRequest {
            model: model.into(),
            system_prompt: Some("You summarize conversations.".into()),
            messages: vec![ChatMessage::user("I booked a flight to Tokyo for March.")],
            max_tokens: 256,
        }
    }

    #[test]
    fn name_defaults_to_model_id() {
        let provider = OpenAiProvider::from_config(&config("http://localhost:1")).unwrap();
        assert_eq!(provider.name(), "gpt-4o-mini");
        assert_eq!(provider.adapter_type(), AdapterType::Provider);

        let named = OpenAiProvider::from_config(&ChatModelConfig {
            name: Some("summarizer".into()),
            ..config("http://localhost:1")
        })
        .unwrap();
        assert_eq!(named.name(), "summarizer");
    }

    #[test]
    fn system_prompt_becomes_leading_system_message() {
        let provider = OpenAiProvider::from_config(&config("http://localhost:1")).unwrap();
        let req = provider.to_chat_request(&request("gpt-4o"));
        assert_eq!(req.model, "gpt-4o");
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, "system");
        assert_eq!(req.messages[1].role, "user");
        assert_eq!(req.max_tokens, Some(256));
    }

    #[test]
    fn empty_request_model_uses_configured_model() {
        let provider = OpenAiProvider::from_config(&config("http://localhost:1")).unwrap();
        let req = provider.to_chat_request(&request(""));
        assert_eq!(req.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn complete_maps_content_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{"role": "system", "content": "You summarize conversations."}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "{\"summary\":\"Trip to Tokyo\",\"facts\":[]}"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 40, "completion_tokens": 12}
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::from_config(&config(&server.uri())).unwrap();
        let resp = provider.complete(request("gpt-4o-mini")).await.unwrap();
        assert!(resp.content.contains("Trip to Tokyo"));
        assert_eq!(resp.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(
            resp.usage,
            Some(TokenUsage {
                input_tokens: 40,
                output_tokens: 12
            })
        );
    }

    #[tokio::test]
    async fn no_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&server.uri(), None)
            .unwrap()
            .with_retry_delay(Duration::from_millis(10));
        let provider = OpenAiProvider::with_client(client, "local-model");
        let err = provider.complete(request("")).await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }
}
