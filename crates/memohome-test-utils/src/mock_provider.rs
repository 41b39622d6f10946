// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat-completion provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured replies,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use memohome_core::MemohomeError;
use memohome_core::traits::adapter::PluginAdapter;
use memohome_core::traits::provider::ProviderAdapter;
use memohome_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};

/// One scripted provider reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text as the completion.
    Text(String),
    /// Fail with a `Provider` error carrying this message.
    Fail(String),
}

/// A mock provider that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" text is returned. Every request is recorded.
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    fail_with: Option<String>,
}

impl MockProvider {
    /// Create a new mock provider with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
            delay: None,
            fail_with: None,
        }
    }

    /// Create a mock provider pre-loaded with text replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let provider = Self::new();
        let queue = responses.into_iter().map(MockReply::Text).collect();
        Self {
            replies: Arc::new(Mutex::new(queue)),
            ..provider
        }
    }

    /// Create a mock provider whose every call fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::new()
        }
    }

    /// Sleep for `delay` before answering (use with paused tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Add a text reply to the end of the queue.
    pub async fn add_response(&self, text: String) {
        self.add_reply(MockReply::Text(text)).await;
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every request received.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Text("mock response".to_string()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MemohomeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MemohomeError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, MemohomeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = match &self.fail_with {
            Some(message) => MockReply::Fail(message.clone()),
            None => self.next_reply().await,
        };
        match reply {
            MockReply::Text(content) => Ok(ProviderResponse {
                content,
                model: request.model,
                usage: Some(TokenUsage {
                    input_tokens: 10,
                    output_tokens: 20,
                }),
            }),
            MockReply::Fail(message) => Err(MemohomeError::Provider {
                message,
                source: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "test-model".to_string(),
            system_prompt: None,
            messages: vec![],
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn default_response_when_queue_empty() {
        let provider = MockProvider::new();
        let resp = provider.complete(request()).await.unwrap();
        assert_eq!(resp.content, "mock response");
        assert_eq!(resp.model, "test-model");
    }

    #[tokio::test]
    async fn queued_responses_returned_in_order() {
        let provider = MockProvider::with_responses(vec!["first".to_string(), "second".to_string()]);

        assert_eq!(provider.complete(request()).await.unwrap().content, "first");
        assert_eq!(provider.complete(request()).await.unwrap().content, "second");
        assert_eq!(provider.complete(request()).await.unwrap().content, "mock response");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn failing_provider_returns_provider_error() {
        let provider = MockProvider::failing("upstream 500");
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, MemohomeError::Provider { ref message, .. } if message == "upstream 500"));
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let provider = MockProvider::new();
        provider.add_reply(MockReply::Fail("once".into())).await;
        assert!(provider.complete(request()).await.is_err());
        let recorded = provider.requests().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].max_tokens, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_uses_tokio_time() {
        let provider = MockProvider::new().with_delay(Duration::from_secs(30));
        let started = tokio::time::Instant::now();
        provider.complete(request()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
