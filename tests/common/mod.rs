//! Shared test doubles.

#![allow(dead_code)]

use async_trait::async_trait;
use scholarswipe::config::PipelineConfig;
use scholarswipe::llm::{ChatMessage, Citation, Completion, CompletionClient};
use scholarswipe::pipeline::ScholarPipeline;
use scholarswipe::prompts::{conclusion, search, summary, title_lookup};
use scholarswipe::{Result, SwipeError};
use std::sync::{Arc, Mutex};

/// Which pipeline stage issued a call, judged by its system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovery,
    TitleLookup,
    Summary,
    Conclusion,
    Unknown,
}

impl Stage {
    fn of(messages: &[ChatMessage]) -> Self {
        let system = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        match system {
            s if s == search::SYSTEM_PROMPT => Stage::Discovery,
            s if s == title_lookup::SYSTEM_PROMPT => Stage::TitleLookup,
            s if s == summary::SYSTEM_PROMPT => Stage::Summary,
            s if s == conclusion::SYSTEM_PROMPT => Stage::Conclusion,
            _ => Stage::Unknown,
        }
    }
}

type Handler = dyn Fn(Stage, &str) -> Result<Completion> + Send + Sync;

/// Completion client answering through a closure of (stage, user prompt).
///
/// Enrichment calls run concurrently, so replies are routed by content rather
/// than by arrival order.
pub struct MockClient {
    handler: Box<Handler>,
    calls: Mutex<Vec<(Stage, String)>>,
}

impl MockClient {
    pub fn new(handler: impl Fn(Stage, &str) -> Result<Completion> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(Stage, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.calls().iter().filter(|(s, _)| *s == stage).count()
    }
}

#[async_trait]
impl CompletionClient for MockClient {
    async fn complete(&self, _model: &str, messages: &[ChatMessage]) -> Result<Completion> {
        let stage = Stage::of(messages);
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.calls.lock().unwrap().push((stage, prompt.clone()));
        (self.handler)(stage, &prompt)
    }
}

pub fn pipeline(client: Arc<MockClient>, config: PipelineConfig) -> ScholarPipeline {
    ScholarPipeline::new(client, config)
}

pub fn test_config() -> PipelineConfig {
    PipelineConfig::for_testing("http://localhost:0")
}

pub fn record(title: &str, url: &str, snippet: &str) -> Citation {
    Citation::Record {
        title: Some(title.to_string()),
        url: url.to_string(),
        snippet: snippet.to_string(),
    }
}

pub fn api_error() -> SwipeError {
    SwipeError::Api {
        code: 503,
        message: "LLM API error: 503 Service Unavailable - upstream down".to_string(),
    }
}

/// Summary JSON without a title, so the paper keeps its own.
pub fn summary_json(findings: &str) -> String {
    serde_json::json!({
        "key_findings": findings,
        "methodology": "Controlled experiments on public benchmarks.",
        "limitations": "Limited to English-language corpora.",
        "summary": "A focused empirical study.",
        "relevance_score": 91,
        "authenticity_score": 94,
    })
    .to_string()
}
