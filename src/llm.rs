//! External language-model client.
//!
//! The pipeline depends on a single capability, "submit a system+user message
//! pair to a model and get text back", expressed as the [`CompletionClient`]
//! trait. [`SonarClient`] implements it against an OpenAI-compatible
//! `/chat/completions` endpoint (Perplexity Sonar by default).
//!
//! Responses are decoded once here: loosely shaped citation entries become
//! [`Citation`] values so the extractor never probes raw JSON.

use crate::config::LlmConfig;
use crate::error::{Result, SwipeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A structured citation attached to a model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    /// Object entry with whichever of title/url/snippet it carried
    Record {
        title: Option<String>,
        url: String,
        snippet: String,
    },
    /// Bare link (or any non-object entry rendered as text)
    Link(String),
}

impl Citation {
    pub fn url(&self) -> &str {
        match self {
            Citation::Record { url, .. } => url,
            Citation::Link(url) => url,
        }
    }
}

/// Model answer: text plus any structured citations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub citations: Vec<Citation>,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    /// Plain-text completion without citations.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Token usage tracking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Accumulated token usage with atomic counters
#[derive(Debug, Default)]
pub struct AtomicTokenUsage {
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    total_tokens: AtomicU64,
}

impl AtomicTokenUsage {
    pub fn add(&self, usage: &TokenUsage) {
        self.prompt_tokens.fetch_add(usage.prompt_tokens, Ordering::Relaxed);
        self.completion_tokens.fetch_add(usage.completion_tokens, Ordering::Relaxed);
        self.total_tokens.fetch_add(usage.total_tokens, Ordering::Relaxed);
    }

    pub fn get(&self) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.completion_tokens.load(Ordering::Relaxed),
            total_tokens: self.total_tokens.load(Ordering::Relaxed),
        }
    }
}

/// "Ask a language model a prompt, get text back."
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<Completion>;
}

/// Run `complete` under a deadline; an elapsed deadline is a [`SwipeError::Timeout`].
pub async fn complete_with_timeout(
    client: &dyn CompletionClient,
    model: &str,
    messages: &[ChatMessage],
    timeout: Duration,
) -> Result<Completion> {
    match tokio::time::timeout(timeout, client.complete(model, messages)).await {
        Ok(result) => result,
        Err(_) => Err(SwipeError::Timeout(timeout.as_secs())),
    }
}

/// OpenAI-compatible chat completions client
pub struct SonarClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    temperature: f32,
}

impl SonarClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SwipeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionClient for SonarClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<Completion> {
        let request_body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": self.temperature,
        });

        let api_url = format!("{}/chat/completions", self.base_url);

        debug!(model = model, messages = messages.len(), "Sending LLM request");

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(SwipeError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SwipeError::Api {
                code: status.as_u16() as i32,
                message: format!("LLM API error: {} - {}", status, error_text),
            });
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SwipeError::Parse(format!("Failed to parse LLM response: {}", e)))?;

        let completion = api_response.into_completion();
        debug!(
            model = model,
            chars = completion.content.len(),
            citations = completion.citations.len(),
            "LLM response received"
        );
        Ok(completion)
    }
}

// === OpenAI-compatible response types ===

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
    #[serde(default)]
    citations: Option<Vec<RawCitation>>,
    #[serde(default)]
    search_results: Option<Vec<RawCitation>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    citations: Option<Vec<RawCitation>>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

/// Citation entry as it appears on the wire
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCitation {
    Link(String),
    Record(Map<String, Value>),
    Other(Value),
}

impl From<RawCitation> for Citation {
    fn from(raw: RawCitation) -> Self {
        match raw {
            RawCitation::Link(url) => Citation::Link(url),
            RawCitation::Record(fields) => Citation::Record {
                title: first_text(&fields, &["title", "name"]),
                url: first_text(&fields, &["url", "link"]).unwrap_or_default(),
                snippet: first_text(&fields, &["text", "snippet", "description"]).unwrap_or_default(),
            },
            RawCitation::Other(Value::Null) => Citation::Link(String::new()),
            RawCitation::Other(value) => Citation::Link(value.to_string()),
        }
    }
}

/// First non-blank string among the aliased keys.
fn first_text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| fields.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

impl ChatCompletionResponse {
    fn into_completion(self) -> Completion {
        let usage = self.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let (content, message_citations) = match self.choices.into_iter().next() {
            Some(choice) => (choice.message.content.unwrap_or_default(), choice.message.citations),
            None => (String::new(), None),
        };

        // Rich search results first so their titles win the first-occurrence dedup
        let mut raw = self.search_results.unwrap_or_default();
        raw.extend(self.citations.or(message_citations).unwrap_or_default());

        Completion {
            content,
            citations: raw.into_iter().map(Citation::from).collect(),
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Completion {
        serde_json::from_value::<ChatCompletionResponse>(value)
            .unwrap()
            .into_completion()
    }

    #[test]
    fn test_decode_content_and_usage() {
        let completion = decode(json!({
            "choices": [{"message": {"role": "assistant", "content": "Title: X"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }));
        assert_eq!(completion.content, "Title: X");
        assert!(completion.citations.is_empty());
        assert_eq!(completion.usage.map(|u| u.total_tokens), Some(15));
    }

    #[test]
    fn test_decode_citation_shapes() {
        let completion = decode(json!({
            "choices": [{"message": {"content": ""}}],
            "citations": [
                "https://arxiv.org/abs/1",
                {"name": "Named", "link": "https://b.org", "description": "desc"},
                {"title": "  ", "name": "Fallback Name", "url": "https://c.org", "text": "t"},
                42,
                null
            ]
        }));
        assert_eq!(
            completion.citations,
            vec![
                Citation::Link("https://arxiv.org/abs/1".into()),
                Citation::Record {
                    title: Some("Named".into()),
                    url: "https://b.org".into(),
                    snippet: "desc".into()
                },
                Citation::Record {
                    title: Some("Fallback Name".into()),
                    url: "https://c.org".into(),
                    snippet: "t".into()
                },
                Citation::Link("42".into()),
                Citation::Link(String::new()),
            ]
        );
    }

    #[test]
    fn test_decode_search_results_before_citations() {
        let completion = decode(json!({
            "choices": [{"message": {"content": "text"}}],
            "search_results": [{"title": "Real Title", "url": "https://a.org", "snippet": "s"}],
            "citations": ["https://a.org"]
        }));
        assert_eq!(completion.citations.len(), 2);
        assert_eq!(completion.citations[0].url(), "https://a.org");
        assert!(matches!(completion.citations[0], Citation::Record { .. }));
    }

    #[test]
    fn test_decode_message_level_citations() {
        let completion = decode(json!({
            "choices": [{"message": {"content": "text", "citations": ["https://m.org"]}}]
        }));
        assert_eq!(completion.citations, vec![Citation::Link("https://m.org".into())]);
    }

    #[test]
    fn test_decode_no_choices() {
        let completion = decode(json!({}));
        assert!(completion.content.is_empty());
        assert!(completion.citations.is_empty());
        assert!(completion.usage.is_none());
    }

    #[test]
    fn test_atomic_usage() {
        let meter = AtomicTokenUsage::default();
        let usage = TokenUsage {
            prompt_tokens: 3,
            completion_tokens: 2,
            total_tokens: 5,
        };
        meter.add(&usage);
        meter.add(&usage);
        assert_eq!(meter.get().total_tokens, 10);
        assert_eq!(meter.get().prompt_tokens, 6);
    }

    struct SlowClient;

    #[async_trait]
    impl CompletionClient for SlowClient {
        async fn complete(&self, _model: &str, _messages: &[ChatMessage]) -> Result<Completion> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Completion::text("late"))
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_error() {
        let result = complete_with_timeout(
            &SlowClient,
            "sonar",
            &[ChatMessage::user("hi")],
            Duration::from_millis(20),
        )
        .await;
        assert!(matches!(result, Err(SwipeError::Timeout(_))));
    }
}
