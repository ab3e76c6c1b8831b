//! Search pipeline orchestration.
//!
//! ```text
//! topic ──▶ discovery call ──▶ extract ──▶ dedupe ──▶ enrich (concurrent) ──▶ SearchResponse
//! papers ──▶ conclusion call ──▶ text
//! papers ──▶ bibliography ──▶ text
//! ```
//!
//! State is request-scoped: nothing survives between calls except the shared
//! client and configuration.

use crate::bibliography;
use crate::conclusion::ConclusionSynthesizer;
use crate::config::{FallbackMode, PipelineConfig};
use crate::dedupe::{dedupe, merge_candidates};
use crate::enrich::SummaryEnricher;
use crate::error::{Result, SwipeError};
use crate::extract::{extract, try_extract, PaperCandidate};
use crate::llm::{complete_with_timeout, AtomicTokenUsage, ChatMessage, CompletionClient, SonarClient};
use crate::paper::{Paper, SearchResponse};
use crate::prompts::search;
use std::sync::Arc;
use tracing::{error, info};

/// Entry point used by the CLI and the HTTP server
pub struct ScholarPipeline {
    client: Arc<dyn CompletionClient>,
    config: PipelineConfig,
}

impl ScholarPipeline {
    pub fn new(client: Arc<dyn CompletionClient>, config: PipelineConfig) -> Self {
        Self { client, config }
    }

    /// Build a pipeline backed by [`SonarClient`].
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let client = SonarClient::new(&config.llm)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Find, deduplicate and summarize papers for a topic.
    ///
    /// In lenient mode this never fails for a non-blank topic.
    pub async fn search(&self, topic: &str) -> Result<SearchResponse> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SwipeError::InvalidInput("Query cannot be empty".to_string()));
        }

        info!(query = topic, mode = %self.config.mode, "Search request");

        let usage = Arc::new(AtomicTokenUsage::default());
        let candidates = self.discover(topic, &usage).await?;

        let papers = match self.config.mode {
            FallbackMode::Lenient => dedupe(candidates, topic, self.config.max_papers),
            FallbackMode::Strict => {
                let papers = merge_candidates(candidates, self.config.max_papers);
                if papers.is_empty() {
                    return Err(SwipeError::NoPapers(topic.to_string()));
                }
                papers
            }
        };

        let enricher = SummaryEnricher::new(Arc::clone(&self.client), &self.config.llm)
            .with_usage_meter(Arc::clone(&usage));
        let papers = enricher
            .enrich_all(papers, topic, self.config.max_concurrency)
            .await;

        let final_usage = usage.get();
        info!(
            query = topic,
            papers = papers.len(),
            prompt_tokens = final_usage.prompt_tokens,
            completion_tokens = final_usage.completion_tokens,
            "Search complete"
        );

        Ok(SearchResponse::new(topic, papers))
    }

    /// Synthesize a cross-paper conclusion.
    pub async fn conclude(&self, papers: &[Paper]) -> Result<String> {
        ConclusionSynthesizer::new(Arc::clone(&self.client), &self.config.llm)
            .synthesize(papers)
            .await
    }

    /// Harvard-style bibliography, accessed today.
    pub fn bibliography(&self, papers: &[Paper]) -> Result<String> {
        bibliography::bibliography(papers)
    }

    /// Ask the search model for papers and extract candidates from the answer.
    async fn discover(&self, topic: &str, usage: &AtomicTokenUsage) -> Result<Vec<PaperCandidate>> {
        let messages = [
            ChatMessage::system(search::SYSTEM_PROMPT),
            ChatMessage::user(search::build_user_prompt(topic)),
        ];

        let result = complete_with_timeout(
            self.client.as_ref(),
            &self.config.llm.search_model,
            &messages,
            self.config.llm.request_timeout,
        )
        .await;

        let completion = match result {
            Ok(completion) => completion,
            Err(e) if self.config.mode == FallbackMode::Lenient => {
                error!(query = topic, error = %e, "Paper discovery failed");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        if let Some(call_usage) = &completion.usage {
            usage.add(call_usage);
        }

        match self.config.mode {
            FallbackMode::Lenient => Ok(extract(&completion, self.config.max_citations)),
            FallbackMode::Strict => try_extract(&completion, self.config.max_citations),
        }
    }
}
