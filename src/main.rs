//! scholarswipe - academic paper search, summarization and synthesis
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! scholarswipe search "graph neural networks"
//! scholarswipe conclude results.json
//! scholarswipe bibliography results.json
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! PERPLEXITY_API_KEY=... scholarswipe serve --port 8000
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::{Args, Parser, Subcommand};
use scholarswipe::{
    bibliography::FORMAT_NAME,
    config::{FallbackMode, LlmConfig, PipelineConfig},
    paper::{BibliographyResponse, ConclusionResponse, Paper, SearchResponse},
    pipeline::ScholarPipeline,
    SwipeError,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// ScholarSwipe - academic paper search, summarization and synthesis
#[derive(Parser)]
#[command(name = "scholarswipe")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search papers for a topic and print the enriched results as JSON
    Search {
        /// Research topic
        topic: String,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Generate a cross-paper conclusion from a JSON file of papers
    Conclude {
        /// JSON array of papers, or a saved search response
        input: PathBuf,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Format a Harvard-style bibliography from a JSON file of papers
    Bibliography {
        /// JSON array of papers, or a saved search response
        input: PathBuf,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[command(flatten)]
        llm: LlmArgs,
    },
}

/// Model service settings shared by the commands that call it
#[derive(Args, Clone)]
struct LlmArgs {
    /// Perplexity (or OpenAI-compatible) API key
    #[arg(long, env = "PERPLEXITY_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// API base URL
    #[arg(long, env = "SCHOLARSWIPE_BASE_URL", default_value = "https://api.perplexity.ai")]
    base_url: String,

    /// Model for paper discovery and title lookup
    #[arg(long, env = "SCHOLARSWIPE_SEARCH_MODEL", default_value = "sonar")]
    search_model: String,

    /// Model for summaries and conclusions
    #[arg(long, env = "SCHOLARSWIPE_SUMMARY_MODEL", default_value = "sonar-pro")]
    summary_model: String,

    /// Per-call timeout in seconds
    #[arg(long, env = "SCHOLARSWIPE_TIMEOUT_SECS", default_value = "60")]
    timeout_secs: u64,

    /// Maximum concurrent summary requests
    #[arg(long, env = "SCHOLARSWIPE_CONCURRENCY", default_value = "10")]
    concurrency: usize,

    /// lenient: substitute demonstration papers; strict: report failures
    #[arg(long, env = "SCHOLARSWIPE_MODE", default_value = "lenient")]
    mode: FallbackMode,
}

impl LlmArgs {
    fn into_config(self) -> PipelineConfig {
        let mut llm = LlmConfig::new(self.api_key);
        llm.base_url = self.base_url;
        llm.search_model = self.search_model;
        llm.summary_model = self.summary_model;
        llm.request_timeout = Duration::from_secs(self.timeout_secs.max(1));

        let mut config = PipelineConfig::new(llm).with_mode(self.mode);
        config.max_concurrency = self.concurrency.max(1);
        config
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    match cli.command {
        Commands::Search { topic, llm } => run_search(topic, llm).await,
        Commands::Conclude { input, llm } => run_conclude(&input, llm).await,
        Commands::Bibliography { input } => run_bibliography(&input),
        Commands::Serve { port, host, llm } => run_server(host, port, llm).await,
    }
}

// ============================================================================
// CLI Commands
// ============================================================================

fn build_pipeline(llm: LlmArgs) -> Result<ScholarPipeline> {
    let config = llm.into_config();
    if !config.llm.has_api_key() {
        warn!("No API key configured (set PERPLEXITY_API_KEY or --api-key)");
    }
    ScholarPipeline::from_config(config).context("Failed to build pipeline")
}

async fn run_search(topic: String, llm: LlmArgs) -> Result<()> {
    let pipeline = build_pipeline(llm)?;
    let response = pipeline.search(&topic).await.context("Search failed")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to serialize results")?
    );
    Ok(())
}

async fn run_conclude(input: &Path, llm: LlmArgs) -> Result<()> {
    let papers = load_papers(input)?;
    let pipeline = build_pipeline(llm)?;
    let conclusion = pipeline
        .conclude(&papers)
        .await
        .context("Conclusion generation failed")?;
    println!("{}", conclusion);
    Ok(())
}

fn run_bibliography(input: &Path) -> Result<()> {
    let papers = load_papers(input)?;
    let bibliography = scholarswipe::bibliography::bibliography(&papers)
        .context("Bibliography generation failed")?;
    println!("{}", bibliography);
    Ok(())
}

/// Saved input: a bare paper list or a whole search response
#[derive(Deserialize)]
#[serde(untagged)]
enum PapersFile {
    Papers(Vec<Paper>),
    Search(SearchResponse),
}

fn load_papers(path: &Path) -> Result<Vec<Paper>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: PapersFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse papers from {}", path.display()))?;
    Ok(match file {
        PapersFile::Papers(papers) => papers,
        PapersFile::Search(response) => response.papers,
    })
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(host: String, port: u16, llm: LlmArgs) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let pipeline = build_pipeline(llm)?;
    let app_state = Arc::new(AppState {
        api_key_configured: pipeline.config().llm.has_api_key(),
        pipeline,
    });

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/search", post(search_handler))
        .route("/generate_conclusion", post(conclusion_handler))
        .route("/generate_bibliography", post(bibliography_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

struct AppState {
    pipeline: ScholarPipeline,
    api_key_configured: bool,
}

/// Error body `{"detail": ...}` with a status derived from the error kind
struct ApiError(SwipeError);

impl From<SwipeError> for ApiError {
    fn from(e: SwipeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SwipeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SwipeError::NoPapers(_) => StatusCode::NOT_FOUND,
            SwipeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            SwipeError::Conclusion(_) | SwipeError::Api { .. } | SwipeError::Network(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

/// Service banner
async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "online",
        "service": "ScholarSwipe API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "perplexity_configured": state.api_key_configured,
    }))
}

/// Search request body
#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
}

/// Papers request body for conclusion and bibliography
#[derive(Debug, Deserialize)]
struct PapersRequest {
    #[serde(default)]
    papers: Vec<Paper>,
}

/// Search endpoint handler
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    Ok(Json(state.pipeline.search(&req.query).await?))
}

/// Conclusion endpoint handler
async fn conclusion_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PapersRequest>,
) -> Result<Json<ConclusionResponse>, ApiError> {
    let conclusion = state.pipeline.conclude(&req.papers).await?;
    Ok(Json(ConclusionResponse {
        conclusion,
        total_papers: req.papers.len(),
    }))
}

/// Bibliography endpoint handler
async fn bibliography_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PapersRequest>,
) -> Result<Json<BibliographyResponse>, ApiError> {
    let bibliography = state.pipeline.bibliography(&req.papers)?;
    Ok(Json(BibliographyResponse {
        bibliography,
        format: FORMAT_NAME.to_string(),
        total_papers: req.papers.len(),
    }))
}
