//! Canonical paper records returned to callers.

use serde::{Deserialize, Serialize};

/// Fixed-shape enrichment record attached to every returned paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredSummary {
    pub title: String,
    pub key_findings: String,
    pub methodology: String,
    pub limitations: String,
    pub summary: String,
    /// 0-100
    pub relevance_score: u8,
    /// 0-100
    pub authenticity_score: u8,
}

/// Where a paper's current title came from.
///
/// Kept out of the wire format; the enricher only asks the model for a title
/// when this is `Unresolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleOrigin {
    /// Title arrived from a caller (deserialized request body)
    #[default]
    Supplied,
    /// Cleaned title found in the service response
    Extracted,
    /// Derived from the URL path
    Url,
    /// Returned by the title-lookup call or the summary call
    Model,
    /// Nothing usable yet; `title` holds the display placeholder
    Unresolved,
}

/// Deduplicated, title-resolved paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    /// Identity key, unique within one result list
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub summary: Option<StructuredSummary>,
    #[serde(skip)]
    pub title_origin: TitleOrigin,
}

impl Paper {
    pub fn new(title: impl Into<String>, url: impl Into<String>, origin: TitleOrigin) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: None,
            abstract_text: None,
            summary: None,
            title_origin: origin,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        let snippet = snippet.into();
        self.snippet = if snippet.trim().is_empty() { None } else { Some(snippet) };
        self
    }

    /// Snippet text if present and non-blank.
    pub fn snippet_text(&self) -> Option<&str> {
        self.snippet.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Response body of a search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub papers: Vec<Paper>,
    pub total_results: usize,
}

impl SearchResponse {
    pub fn new(query: impl Into<String>, papers: Vec<Paper>) -> Self {
        Self {
            query: query.into(),
            total_results: papers.len(),
            papers,
        }
    }
}

/// Response body of conclusion generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConclusionResponse {
    pub conclusion: String,
    pub total_papers: usize,
}

/// Response body of bibliography generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibliographyResponse {
    pub bibliography: String,
    pub format: String,
    pub total_papers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_wire_format() {
        let paper = Paper::new("Graph Attention Networks", "https://arxiv.org/abs/1710.10903", TitleOrigin::Extracted)
            .with_snippet("Attention over graph neighbourhoods.");
        let value = serde_json::to_value(&paper).unwrap();
        assert_eq!(value["title"], "Graph Attention Networks");
        assert!(value.get("abstract").is_some());
        assert!(value.get("title_origin").is_none());
    }

    #[test]
    fn test_paper_deserialize_minimal() {
        let paper: Paper =
            serde_json::from_str(r#"{"title": "T", "url": "https://example.org/t"}"#).unwrap();
        assert_eq!(paper.title_origin, TitleOrigin::Supplied);
        assert!(paper.summary.is_none());
        assert!(paper.snippet_text().is_none());
    }

    #[test]
    fn test_blank_snippet_dropped() {
        let paper = Paper::new("T", "https://example.org", TitleOrigin::Extracted).with_snippet("  ");
        assert!(paper.snippet.is_none());
    }
}
