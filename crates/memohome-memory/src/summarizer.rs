// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation summarization through a chat-completion model.
//!
//! The model is asked for a JSON object carrying a third-person digest and
//! a list of salient facts. Replies wrapped in markdown fences or prose are
//! tolerated; a reply that is not JSON at all is used verbatim as the digest.

use std::sync::Arc;
use std::time::{Duration, Instant};

use memohome_core::traits::ProviderAdapter;
use memohome_core::types::{ChatMessage, MemoryFact, ProviderRequest};
use memohome_core::MemohomeError;
use serde::Deserialize;
use tracing::debug;

use crate::recording;

/// Default bound on a single summarization call.
pub const DEFAULT_SUMMARIZATION_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_SUMMARY_MAX_TOKENS: u32 = 1024;

const SUMMARY_SYSTEM_PROMPT: &str = "You condense conversations into long-term memory for a personal assistant. You reply with JSON only.";

/// User prompt for summarization. `{conversation}` is replaced with the transcript.
const SUMMARY_PROMPT: &str = r#"Summarize the conversation below so it can be recalled months from now.

Write "summary": a concise third-person digest (e.g. "The user booked a flight to Tokyo for March 3rd").
Keep names, dates, places, preferences, decisions and commitments. Drop greetings, filler and small talk.

Write "facts": standalone statements worth remembering, each with a "category" from:
personal, preference, project, decision, commitment, other.
Use an empty array when nothing is worth remembering on its own.

Conversation:
{conversation}

Output a JSON object only, no explanation:
{"summary": "...", "facts": [{"content": "...", "category": "..."}]}"#;

/// Output of a summarization call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub summary: String,
    pub facts: Vec<MemoryFact>,
}

#[derive(Deserialize)]
struct DigestReply {
    summary: String,
    #[serde(default)]
    facts: Vec<MemoryFact>,
}

/// Condenses conversation transcripts into a [`Digest`].
pub struct Summarizer {
    provider: Arc<dyn ProviderAdapter>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl Summarizer {
    /// Create a summarizer calling `model` through `provider`.
    pub fn new(provider: Arc<dyn ProviderAdapter>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: DEFAULT_SUMMARY_MAX_TOKENS,
            timeout: DEFAULT_SUMMARIZATION_TIMEOUT,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Summarize a transcript.
    ///
    /// Fails with `InvalidInput` for an empty transcript and with
    /// `SummarizationFailed` when the model errors, times out or replies with
    /// nothing usable. There is no retry.
    pub async fn summarize(&self, messages: &[ChatMessage]) -> Result<Digest, MemohomeError> {
        if messages.is_empty() {
            return Err(MemohomeError::InvalidInput(
                "cannot summarize an empty conversation".into(),
            ));
        }

        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt: Some(SUMMARY_SYSTEM_PROMPT.to_string()),
            messages: vec![ChatMessage::user(build_summary_prompt(messages))],
            max_tokens: self.max_tokens,
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.provider.complete(request)).await;
        recording::record_model_call("summarize", started.elapsed().as_secs_f64());

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(MemohomeError::SummarizationFailed {
                    message: format!("summary model `{}` failed", self.model),
                    source: Some(Box::new(e)),
                });
            }
            Err(_) => {
                return Err(MemohomeError::SummarizationFailed {
                    message: format!("summary model `{}` timed out", self.model),
                    source: Some(Box::new(MemohomeError::Timeout {
                        duration: self.timeout,
                    })),
                });
            }
        };

        let digest = parse_summary_response(&response.content)?;
        debug!(
            model = %response.model,
            messages = messages.len(),
            facts = digest.facts.len(),
            "conversation summarized"
        );
        Ok(digest)
    }
}

/// Render the transcript as `Role: content` lines inside the summary prompt.
fn build_summary_prompt(messages: &[ChatMessage]) -> String {
    let mut conversation = String::new();
    for msg in messages {
        let role = msg.role.to_string();
        let mut chars = role.chars();
        let label: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => role,
        };
        conversation.push_str(&format!("{label}: {}\n", msg.content));
    }
    SUMMARY_PROMPT.replace("{conversation}", conversation.trim_end())
}

/// Parse a summary model reply into a [`Digest`].
///
/// Handles bare JSON, JSON inside markdown code fences or surrounding prose,
/// and plain text (used as the summary with no facts).
pub fn parse_summary_response(response: &str) -> Result<Digest, MemohomeError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(MemohomeError::summarization("summary model returned an empty reply"));
    }

    let json_str = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    };

    if let Some(json_str) = json_str
        && let Ok(reply) = serde_json::from_str::<DigestReply>(json_str)
    {
        let summary = reply.summary.trim();
        if summary.is_empty() {
            return Err(MemohomeError::summarization(
                "summary model returned an empty summary field",
            ));
        }
        let facts = reply
            .facts
            .into_iter()
            .filter(|f| !f.content.trim().is_empty())
            .collect();
        return Ok(Digest {
            summary: summary.to_string(),
            facts,
        });
    }

    let summary = strip_code_fence(trimmed);
    if summary.is_empty() {
        return Err(MemohomeError::summarization(
            "summary model returned an empty code block",
        ));
    }

    debug!("summary reply is not JSON, using it as plain text");
    Ok(Digest {
        summary: summary.to_string(),
        facts: Vec::new(),
    })
}

/// Remove a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string (e.g. "text") on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use memohome_test_utils::{MockProvider, MockReply};

    fn transcript() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("Hi! I just booked my flight to Tokyo for March 3rd."),
            ChatMessage::assistant("Great, do you need a hotel too?"),
            ChatMessage::user("Yes, somewhere near Shinjuku please."),
        ]
    }

    #[test]
    fn parse_bare_json() {
        let digest = parse_summary_response(
            r#"{"summary": "The user booked a flight to Tokyo.", "facts": [{"content": "Flies to Tokyo on March 3rd", "category": "commitment"}]}"#,
        )
        .unwrap();
        assert_eq!(digest.summary, "The user booked a flight to Tokyo.");
        assert_eq!(digest.facts.len(), 1);
        assert_eq!(digest.facts[0].category, "commitment");
    }

    #[test]
    fn parse_json_in_code_fence() {
        let reply = "```json\n{\"summary\": \"Discussed the trip budget.\", \"facts\": []}\n```";
        let digest = parse_summary_response(reply).unwrap();
        assert_eq!(digest.summary, "Discussed the trip budget.");
        assert!(digest.facts.is_empty());
    }

    #[test]
    fn parse_json_with_surrounding_prose() {
        let reply = "Here is the digest:\n{\"summary\": \"Likes green tea.\"}\nHope that helps!";
        let digest = parse_summary_response(reply).unwrap();
        assert_eq!(digest.summary, "Likes green tea.");
        assert!(digest.facts.is_empty());
    }

    #[test]
    fn plain_text_reply_becomes_summary() {
        let digest = parse_summary_response("  The user plans a trip to Tokyo.  ").unwrap();
        assert_eq!(digest.summary, "The user plans a trip to Tokyo.");
        assert!(digest.facts.is_empty());
    }

    #[test]
    fn plain_text_in_fence_is_unwrapped() {
        let digest = parse_summary_response("```text\nThe user likes hiking.\n```").unwrap();
        assert_eq!(digest.summary, "The user likes hiking.");
    }

    #[test]
    fn empty_reply_fails() {
        let err = parse_summary_response("   \n").unwrap_err();
        assert!(matches!(err, MemohomeError::SummarizationFailed { .. }));
    }

    #[test]
    fn fence_without_body_fails() {
        for reply in ["```\n```", "```json```", "```text\n   \n```"] {
            let err = parse_summary_response(reply).unwrap_err();
            assert!(
                matches!(err, MemohomeError::SummarizationFailed { .. }),
                "{reply:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn empty_summary_field_fails() {
        let err = parse_summary_response(r#"{"summary": "  ", "facts": []}"#).unwrap_err();
        assert!(matches!(err, MemohomeError::SummarizationFailed { .. }));
    }

    #[test]
    fn blank_facts_are_dropped() {
        let digest = parse_summary_response(
            r#"{"summary": "s", "facts": [{"content": " "}, {"content": "Owns a cat"}]}"#,
        )
        .unwrap();
        assert_eq!(digest.facts.len(), 1);
        assert_eq!(digest.facts[0].content, "Owns a cat");
    }

    #[test]
    fn prompt_contains_labelled_transcript() {
        let prompt = build_summary_prompt(&transcript());
        assert!(prompt.contains("User: Hi! I just booked my flight to Tokyo for March 3rd."));
        assert!(prompt.contains("Assistant: Great, do you need a hotel too?"));
        assert!(!prompt.contains("{conversation}"));
    }

    #[tokio::test]
    async fn summarize_sends_configured_model_and_tokens() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            r#"{"summary": "The user booked a flight to Tokyo and wants a hotel near Shinjuku."}"#
                .to_string(),
        ]));
        let summarizer = Summarizer::new(provider.clone(), "gpt-4o-mini").with_max_tokens(300);

        let digest = summarizer.summarize(&transcript()).await.unwrap();
        assert!(digest.summary.contains("Tokyo"));

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].max_tokens, 300);
        assert!(requests[0].system_prompt.is_some());
    }

    #[tokio::test]
    async fn empty_transcript_is_invalid_input() {
        let provider = Arc::new(MockProvider::new());
        let summarizer = Summarizer::new(provider.clone(), "m");
        let err = summarizer.summarize(&[]).await.unwrap_err();
        assert!(matches!(err, MemohomeError::InvalidInput(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn provider_error_becomes_summarization_failed() {
        let provider = Arc::new(MockProvider::new());
        provider.add_reply(MockReply::Fail("HTTP 500".into())).await;
        let summarizer = Summarizer::new(provider, "m");

        let err = summarizer.summarize(&transcript()).await.unwrap_err();
        match err {
            MemohomeError::SummarizationFailed { source, .. } => {
                let source = source.expect("provider error kept as source");
                assert!(source.to_string().contains("HTTP 500"));
            }
            other => panic!("expected SummarizationFailed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_summarization_failed() {
        let provider = Arc::new(MockProvider::new().with_delay(Duration::from_secs(120)));
        let summarizer = Summarizer::new(provider, "slow").with_timeout(Duration::from_secs(5));

        let err = summarizer.summarize(&transcript()).await.unwrap_err();
        match err {
            MemohomeError::SummarizationFailed { source, .. } => {
                let source = source.expect("timeout kept as source");
                assert!(source.to_string().contains("timed out"));
            }
            other => panic!("expected SummarizationFailed, got {other:?}"),
        }
    }
}
