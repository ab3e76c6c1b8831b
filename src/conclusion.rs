//! Cross-paper conclusion synthesis.
//!
//! One model call over all enriched papers. Unlike per-paper summaries there is
//! no local substitute: a failed call surfaces as [`SwipeError::Conclusion`].

use crate::config::LlmConfig;
use crate::error::{Result, SwipeError};
use crate::llm::{complete_with_timeout, ChatMessage, CompletionClient};
use crate::paper::Paper;
use crate::prompts::conclusion::{build_user_prompt, SYSTEM_PROMPT};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Rendered in place of a missing summary field
const MISSING_FIELD: &str = "N/A";

pub struct ConclusionSynthesizer {
    client: Arc<dyn CompletionClient>,
    model: String,
    timeout: Duration,
}

impl ConclusionSynthesizer {
    pub fn new(client: Arc<dyn CompletionClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            model: config.summary_model.clone(),
            timeout: config.request_timeout,
        }
    }

    /// Write a 2-3 paragraph plain-text synthesis of `papers`.
    ///
    /// An empty list is rejected before any call is made.
    pub async fn synthesize(&self, papers: &[Paper]) -> Result<String> {
        if papers.is_empty() {
            return Err(SwipeError::InvalidInput("No papers provided".to_string()));
        }

        info!(papers = papers.len(), model = %self.model, "Generating conclusion");

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(papers.len(), &render_papers(papers))),
        ];

        let completion = complete_with_timeout(self.client.as_ref(), &self.model, &messages, self.timeout)
            .await
            .map_err(|e| {
                error!(error = %e, "Conclusion generation failed");
                SwipeError::Conclusion(Box::new(e))
            })?;

        let conclusion = completion.content.trim();
        if conclusion.is_empty() {
            error!("Conclusion generation returned no text");
            return Err(SwipeError::Conclusion(Box::new(SwipeError::Parse(
                "model returned an empty conclusion".to_string(),
            ))));
        }

        Ok(conclusion.to_string())
    }
}

/// One block per paper: title, overall summary and key findings.
pub fn render_papers(papers: &[Paper]) -> String {
    papers
        .iter()
        .enumerate()
        .map(|(i, paper)| {
            let summary = paper.summary.as_ref();
            format!(
                "Paper {}: {}\nSummary: {}\nKey Findings: {}",
                i + 1,
                paper.title,
                summary.map_or(MISSING_FIELD, |s| s.summary.as_str()),
                summary.map_or(MISSING_FIELD, |s| s.key_findings.as_str()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
