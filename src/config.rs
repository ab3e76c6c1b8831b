//! Pipeline configuration.
//!
//! The binary fills these from CLI flags (each with an environment fallback);
//! tests use [`PipelineConfig::for_testing`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default values shared by the CLI and the library.
pub mod defaults {
    use std::time::Duration;

    /// Perplexity's OpenAI-compatible endpoint.
    pub const BASE_URL: &str = "https://api.perplexity.ai";

    /// Model used for paper discovery and title lookups.
    pub const SEARCH_MODEL: &str = "sonar";

    /// Model used for structured summaries and conclusions.
    pub const SUMMARY_MODEL: &str = "sonar-pro";

    /// Sampling temperature sent with every call.
    pub const TEMPERATURE: f32 = 0.1;

    /// Per-call deadline for the external model.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Maximum concurrent enrichment calls.
    pub const MAX_CONCURRENCY: usize = 10;

    /// Maximum papers returned by a search.
    pub const MAX_PAPERS: usize = 10;

    /// Maximum structured citations / free-text entries read from one response.
    pub const MAX_CITATIONS: usize = 12;
}

/// How the pipeline reacts when search yields nothing usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// Substitute demonstration papers and swallow extraction failures.
    #[default]
    Lenient,
    /// Surface extraction failures and empty results as errors.
    Strict,
}

impl FromStr for FallbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(FallbackMode::Lenient),
            "strict" => Ok(FallbackMode::Strict),
            other => Err(format!("unknown fallback mode '{}' (expected lenient or strict)", other)),
        }
    }
}

impl fmt::Display for FallbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackMode::Lenient => f.write_str("lenient"),
            FallbackMode::Strict => f.write_str("strict"),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub search_model: String,
    pub summary_model: String,
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            api_key: api_key.into(),
            search_model: defaults::SEARCH_MODEL.to_string(),
            summary_model: defaults::SUMMARY_MODEL.to_string(),
            temperature: defaults::TEMPERATURE,
            request_timeout: defaults::REQUEST_TIMEOUT,
        }
    }

    /// Whether an API key has been supplied at all.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub llm: LlmConfig,
    pub max_concurrency: usize,
    pub max_papers: usize,
    pub max_citations: usize,
    pub mode: FallbackMode,
}

impl PipelineConfig {
    pub fn new(llm: LlmConfig) -> Self {
        Self {
            llm,
            max_concurrency: defaults::MAX_CONCURRENCY,
            max_papers: defaults::MAX_PAPERS,
            max_citations: defaults::MAX_CITATIONS,
            mode: FallbackMode::default(),
        }
    }

    /// Configuration pointed at a mock server with short deadlines.
    pub fn for_testing(base_url: &str) -> Self {
        let mut llm = LlmConfig::new("test-key");
        llm.base_url = base_url.to_string();
        llm.request_timeout = Duration::from_secs(5);
        Self::new(llm)
    }

    pub fn with_mode(mut self, mode: FallbackMode) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_mode_parse() {
        assert_eq!("strict".parse::<FallbackMode>(), Ok(FallbackMode::Strict));
        assert_eq!(" Lenient ".parse::<FallbackMode>(), Ok(FallbackMode::Lenient));
        assert!("loose".parse::<FallbackMode>().is_err());
        assert_eq!(FallbackMode::Strict.to_string(), "strict");
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new(LlmConfig::new(""));
        assert_eq!(config.max_papers, 10);
        assert_eq!(config.max_citations, 12);
        assert_eq!(config.mode, FallbackMode::Lenient);
        assert_eq!(config.llm.search_model, "sonar");
        assert_eq!(config.llm.summary_model, "sonar-pro");
        assert!(!config.llm.has_api_key());
    }

    #[test]
    fn test_for_testing() {
        let config = PipelineConfig::for_testing("http://127.0.0.1:9999");
        assert_eq!(config.llm.base_url, "http://127.0.0.1:9999");
        assert!(config.llm.has_api_key());
    }
}
