//! Candidate extraction from a discovery response.
//!
//! A response can carry structured citations, free text in the
//! `Title:` / `URL:` / `Description:` layout requested by
//! [`crate::prompts::search`], or both. Both paths are read and merged by URL
//! into an ordered list of [`PaperCandidate`]s: structured entries first, then
//! text-only entries in textual order.

use crate::error::{Result, SwipeError};
use crate::llm::{Citation, Completion};
use crate::title::{clean_title, try_title_from_url};
use regex::Regex;
use tracing::{debug, error, info};
use url::Url;

/// Maximum snippet length taken from a free-text description
const MAX_DESCRIPTION_CHARS: usize = 200;

/// Title state of an unmerged candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateTitle {
    /// No usable title yet
    Unresolved,
    /// Cleaned title found in the response
    Extracted(String),
    /// Derived from the URL path
    FromUrl(String),
}

impl CandidateTitle {
    /// Clean a raw title; fall back to the URL, then to `Unresolved`.
    pub fn from_raw(raw: Option<&str>, url: &str) -> Self {
        match raw.and_then(clean_title) {
            Some(title) => CandidateTitle::Extracted(title),
            None => Self::from_url(url),
        }
    }

    pub fn from_url(url: &str) -> Self {
        try_title_from_url(url).map_or(CandidateTitle::Unresolved, CandidateTitle::FromUrl)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CandidateTitle::Unresolved => None,
            CandidateTitle::Extracted(t) | CandidateTitle::FromUrl(t) => Some(t),
        }
    }

    /// A resolved title beats an unresolved one; otherwise longer wins.
    fn is_better_than(&self, current: &CandidateTitle) -> bool {
        match (self.as_str(), current.as_str()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(new), Some(old)) => new.chars().count() > old.chars().count(),
        }
    }
}

/// Unmerged paper record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperCandidate {
    pub title: CandidateTitle,
    pub url: String,
    pub snippet: String,
}

/// Extract candidates, degrading to an empty list on any failure.
pub fn extract(completion: &Completion, max_entries: usize) -> Vec<PaperCandidate> {
    match try_extract(completion, max_entries) {
        Ok(candidates) => candidates,
        Err(e) => {
            error!(error = %e, "Candidate extraction failed");
            Vec::new()
        }
    }
}

/// Extract candidates from structured citations and free text.
pub fn try_extract(completion: &Completion, max_entries: usize) -> Result<Vec<PaperCandidate>> {
    let mut candidates = from_citations(&completion.citations, max_entries)?;
    let structured = candidates.len();

    if !completion.content.trim().is_empty() {
        let entries = parse_text_entries(&completion.content, max_entries)?;
        debug!(entries = entries.len(), "Parsed free-text entries");
        merge_text_entries(&mut candidates, entries);
    }

    info!(
        structured = structured,
        total = candidates.len(),
        "Extracted paper candidates"
    );
    Ok(candidates)
}

/// Structured path: up to `max_entries` citations, in order.
fn from_citations(citations: &[Citation], max_entries: usize) -> Result<Vec<PaperCandidate>> {
    let tag_regex = Regex::new(r"<[^>]+>").map_err(|e| SwipeError::Parse(e.to_string()))?;

    Ok(citations
        .iter()
        .take(max_entries)
        .map(|citation| match citation {
            Citation::Record {
                title,
                url,
                snippet,
            } => {
                let url = url.trim().to_string();
                PaperCandidate {
                    title: CandidateTitle::from_raw(title.as_deref(), &url),
                    snippet: collapse_whitespace(&tag_regex.replace_all(snippet, " ")),
                    url,
                }
            }
            Citation::Link(url) => {
                let url = url.trim().to_string();
                PaperCandidate {
                    title: CandidateTitle::from_url(&url),
                    snippet: String::new(),
                    url,
                }
            }
        })
        .collect())
}

/// One `Title:`/`URL:`/`Description:` window from free text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextEntry {
    pub title: Option<String>,
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
struct PendingEntry {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
}

impl PendingEntry {
    fn finish(self) -> Option<TextEntry> {
        self.url.map(|url| TextEntry {
            title: self.title,
            url,
            description: self.description,
        })
    }
}

/// Split free text into labelled entries.
///
/// Labels are matched case-insensitively and may carry markdown emphasis.
/// A label must open its line, optionally after a bullet or list number; the
/// one exception is `URL:` directly followed by an http(s) link, which may
/// also sit mid-line. Words like "title:" inside running prose are text.
///
/// Each label's value runs until the next label; a `Title:` always opens a new
/// entry, and so does a `URL:` when the open entry already has one. Titles end
/// at a newline, descriptions at a blank line. Entries without a valid
/// http(s) URL are dropped.
pub fn parse_text_entries(text: &str, max_entries: usize) -> Result<Vec<TextEntry>> {
    let label_regex = Regex::new(
        r"(?im)^[ \t]*(?:[-*+>]|\d+[.)])?[ \t]*\**(?P<name>title|url|description)\**[ \t]*:|\b(?P<inline>url\**[ \t]*:)[ \t*<]*https?://",
    )
    .map_err(|e| SwipeError::Parse(e.to_string()))?;

    let labels: Vec<(String, usize, usize)> = label_regex
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if let Some(inline) = caps.name("inline") {
                return Some(("url".to_string(), whole.start(), inline.end()));
            }
            let name = caps.name("name")?.as_str().to_ascii_lowercase();
            Some((name, whole.start(), whole.end()))
        })
        .collect();

    let mut entries = Vec::new();
    let mut current = PendingEntry::default();

    for (idx, (name, _, value_start)) in labels.iter().enumerate() {
        let value_end = labels.get(idx + 1).map_or(text.len(), |next| next.1);
        let value = &text[*value_start..value_end];

        match name.as_str() {
            "title" => {
                entries.extend(std::mem::take(&mut current).finish());
                current.title = value.lines().next().map(clean_value).filter(|t| !t.is_empty());
            }
            "url" => {
                let Some(url) = parse_url_value(value) else {
                    continue;
                };
                if current.url.is_some() {
                    entries.extend(std::mem::take(&mut current).finish());
                }
                current.url = Some(url);
            }
            _ => {
                if current.description.is_none() {
                    current.description = parse_description_value(value);
                }
            }
        }
    }
    entries.extend(current.finish());

    entries.truncate(max_entries);
    Ok(entries)
}

/// Fold free-text entries into the structured candidates by URL.
fn merge_text_entries(candidates: &mut Vec<PaperCandidate>, entries: Vec<TextEntry>) {
    for entry in entries {
        let title = CandidateTitle::from_raw(entry.title.as_deref(), &entry.url);

        if let Some(existing) = candidates.iter_mut().find(|c| c.url == entry.url) {
            if title.is_better_than(&existing.title) {
                existing.title = title;
            }
            if existing.snippet.is_empty() {
                if let Some(description) = entry.description {
                    existing.snippet = description;
                }
            }
        } else {
            candidates.push(PaperCandidate {
                title,
                url: entry.url,
                snippet: entry.description.unwrap_or_default(),
            });
        }
    }
}

/// First token of a `URL:` value, if it is a valid http(s) URL.
fn parse_url_value(value: &str) -> Option<String> {
    let token = value
        .trim_start_matches(|c: char| c.is_whitespace() || c == '*' || c == '<')
        .split_whitespace()
        .next()?
        .trim_end_matches(['*', '>', ')', ']', ',', ';', '.']);

    let parsed = Url::parse(token).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| token.to_string())
}

fn parse_description_value(value: &str) -> Option<String> {
    let normalized = value.replace("\r\n", "\n");
    let paragraph = normalized.split("\n\n").next().unwrap_or_default();
    let description: String = clean_value(paragraph)
        .chars()
        .take(MAX_DESCRIPTION_CHARS)
        .collect();
    let description = description.trim_end().to_string();
    (!description.is_empty()).then_some(description)
}

/// Trim whitespace and markdown emphasis, collapse inner whitespace.
fn clean_value(value: &str) -> String {
    collapse_whitespace(value.trim_matches(|c: char| c.is_whitespace() || c == '*'))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(candidates: &[PaperCandidate]) -> Vec<Option<&str>> {
        candidates.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_single_free_text_entry() {
        let completion = Completion::text(
            "Title: Learning to Rank\nURL: https://arxiv.org/abs/1234\nDescription: A study of ranking.",
        );
        let candidates = extract(&completion, 12);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, CandidateTitle::Extracted("Learning to Rank".into()));
        assert_eq!(candidates[0].url, "https://arxiv.org/abs/1234");
        assert_eq!(candidates[0].snippet, "A study of ranking.");
    }

    #[test]
    fn test_two_pairs_in_order() {
        let text = "Here are papers.\n\n\
            1. Title: Graph Attention Networks\n   URL: https://arxiv.org/abs/1710.10903\n   Description: Attention on graphs.\n\n\
            2. Title: Semi-Supervised Classification with GCNs\n   URL: https://arxiv.org/abs/1609.02907\n   Description: Spectral convolutions.\n";
        let candidates = extract(&Completion::text(text), 12);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title.as_str(), Some("Graph Attention Networks"));
        assert_eq!(candidates[0].url, "https://arxiv.org/abs/1710.10903");
        assert_eq!(candidates[1].title.as_str(), Some("Semi-Supervised Classification with GCNs"));
        assert_eq!(candidates[1].url, "https://arxiv.org/abs/1609.02907");
        assert_eq!(candidates[1].snippet, "Spectral convolutions.");
    }

    #[test]
    fn test_missing_title_does_not_shift_pairs() {
        let text = "URL: https://a.org/1\n\nTitle: Second Paper\nURL: https://b.org/2\n\nTitle: Third Paper\nURL: https://c.org/3";
        let candidates = extract(&Completion::text(text), 12);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].title, CandidateTitle::Unresolved);
        assert_eq!(candidates[1].title.as_str(), Some("Second Paper"));
        assert_eq!(candidates[1].url, "https://b.org/2");
        assert_eq!(candidates[2].title.as_str(), Some("Third Paper"));
        assert_eq!(candidates[2].url, "https://c.org/3");
    }

    #[test]
    fn test_title_without_url_is_dropped() {
        let text = "Title: Orphan\n\nTitle: Kept Paper\nURL: https://k.org/p";
        let entries = parse_text_entries(text, 12).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Kept Paper"));
    }

    #[test]
    fn test_markdown_labels_and_inline_url() {
        let text = "**Title:** Neural Ranking Models\n**URL:** <https://acm.org/doi/10.1145/1>\n\
            - title: Dense Retrieval URL: https://arxiv.org/abs/2004.04906).";
        let entries = parse_text_entries(text, 12).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("Neural Ranking Models"));
        assert_eq!(entries[0].url, "https://acm.org/doi/10.1145/1");
        assert_eq!(entries[1].title.as_deref(), Some("Dense Retrieval"));
        assert_eq!(entries[1].url, "https://arxiv.org/abs/2004.04906");
    }

    #[test]
    fn test_labels_inside_prose_are_text() {
        let text = "Title: Neural Ranking Revisited\n\
            URL: https://arxiv.org/abs/2101.00001\n\
            Description: We revisit the original paper's title: and url: choices, then compare.\n\n\
            Title: Second Study\nURL: https://arxiv.org/abs/2101.00002";
        let entries = parse_text_entries(text, 12).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].description.as_deref(),
            Some("We revisit the original paper's title: and url: choices, then compare.")
        );
        assert_eq!(entries[1].title.as_deref(), Some("Second Study"));
    }

    #[test]
    fn test_numbered_and_bulleted_labels() {
        let text = "1) **Title**: Bulleted One\n   - URL: https://a.org/one\n\
            * Description: First.\n\
            2. title: Numbered Two\n   url: https://b.org/two";
        let entries = parse_text_entries(text, 12).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("Bulleted One"));
        assert_eq!(entries[0].url, "https://a.org/one");
        assert_eq!(entries[0].description.as_deref(), Some("First."));
        assert_eq!(entries[1].title.as_deref(), Some("Numbered Two"));
        assert_eq!(entries[1].url, "https://b.org/two");
    }

    #[test]
    fn test_non_http_url_ignored() {
        let entries = parse_text_entries("Title: X Paper\nURL: ftp://files.org/x", 12).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_description_bounded_by_blank_line_and_length() {
        let long = "word ".repeat(100);
        let text = format!("Title: A Paper\nURL: https://a.org/p\nDescription: {}\n\nUnrelated trailing prose.", long);
        let entries = parse_text_entries(&text, 12).unwrap();
        let description = entries[0].description.clone().unwrap();
        assert!(description.chars().count() <= 200);
        assert!(!description.contains("Unrelated"));
    }

    #[test]
    fn test_structured_citations() {
        let completion = Completion {
            content: String::new(),
            citations: vec![
                Citation::Record {
                    title: Some("title: deep residual learning.pdf".into()),
                    url: "https://arxiv.org/abs/1512.03385".into(),
                    snippet: "<p>Residual   nets</p>".into(),
                },
                Citation::Link("https://example.org/papers/graph-neural-networks-survey".into()),
                Citation::Record {
                    title: Some("Research Paper".into()),
                    url: "https://arxiv.org/abs/1".into(),
                    snippet: String::new(),
                },
            ],
            usage: None,
        };
        let candidates = extract(&completion, 12);
        assert_eq!(
            titles(&candidates),
            vec![Some("Deep Residual Learning"), Some("Graph Neural Networks Survey"), None]
        );
        assert_eq!(candidates[0].snippet, "Residual nets");
        assert_eq!(candidates[1].title, CandidateTitle::FromUrl("Graph Neural Networks Survey".into()));
    }

    #[test]
    fn test_structured_cap() {
        let citations = (0..20)
            .map(|i| Citation::Link(format!("https://a.org/{}", i)))
            .collect();
        let completion = Completion {
            citations,
            ..Default::default()
        };
        assert_eq!(extract(&completion, 12).len(), 12);
    }

    #[test]
    fn test_merge_upgrades_structured_entries() {
        let completion = Completion {
            content: "Title: Learning to Rank\nURL: https://arxiv.org/abs/1234\nDescription: A study of ranking.\n\n\
                Title: Short\nURL: https://b.org/long\n\n\
                Title: Text Only Paper\nURL: https://c.org/t"
                .into(),
            citations: vec![
                Citation::Link("https://arxiv.org/abs/1234".into()),
                Citation::Record {
                    title: Some("A Much Longer Structured Title".into()),
                    url: "https://b.org/long".into(),
                    snippet: "kept".into(),
                },
            ],
            usage: None,
        };
        let candidates = extract(&completion, 12);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].title.as_str(), Some("Learning to Rank"));
        assert_eq!(candidates[0].snippet, "A study of ranking.");
        assert_eq!(candidates[1].title.as_str(), Some("A Much Longer Structured Title"));
        assert_eq!(candidates[1].snippet, "kept");
        assert_eq!(candidates[2].title.as_str(), Some("Text Only Paper"));
    }

    #[test]
    fn test_longer_text_title_wins() {
        let completion = Completion {
            content: "Title: Attention Is All You Need\nURL: https://arxiv.org/abs/1706.03762".into(),
            citations: vec![Citation::Record {
                title: Some("Attention".into()),
                url: "https://arxiv.org/abs/1706.03762".into(),
                snippet: String::new(),
            }],
            usage: None,
        };
        let candidates = extract(&completion, 12);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title.as_str(), Some("Attention Is All You Need"));
    }

    #[test]
    fn test_empty_completion() {
        assert!(extract(&Completion::default(), 12).is_empty());
        assert!(extract(&Completion::text("No papers, sorry."), 12).is_empty());
    }
}
