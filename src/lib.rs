//! # scholarswipe
//!
//! Academic paper search over an LLM search service, with result
//! normalization, per-paper structured summaries and cross-paper synthesis.
//!
//! ## Modules
//!
//! - [`title`] - Title cleanup and URL-derived titles
//! - [`extract`] - Candidate extraction from citations and free text
//! - [`dedupe`] - Merge/dedup into canonical papers
//! - [`enrich`] - Structured summaries with deterministic fallback
//! - [`conclusion`] - Cross-paper conclusion synthesis
//! - [`bibliography`] - Harvard-style bibliography
//! - [`pipeline`] - End-to-end orchestration
//! - [`llm`] - Model client abstraction and HTTP implementation
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scholarswipe::{config::{LlmConfig, PipelineConfig}, pipeline::ScholarPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::new(LlmConfig::new("pplx-..."));
//!     let pipeline = ScholarPipeline::from_config(config)?;
//!     let response = pipeline.search("graph neural networks").await?;
//!     println!("Found {} papers", response.total_results);
//!     Ok(())
//! }
//! ```

pub mod bibliography;
pub mod conclusion;
pub mod config;
pub mod dedupe;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod llm;
pub mod paper;
pub mod pipeline;
pub mod prompts;
pub mod title;

pub use error::{Result, SwipeError};
