//! Harvard-style bibliography formatting.

use crate::error::{Result, SwipeError};
use crate::paper::Paper;
use chrono::{Local, NaiveDate};

/// Citation style name reported alongside the bibliography
pub const FORMAT_NAME: &str = "Harvard";

const UNKNOWN_TITLE: &str = "Unknown Paper";

/// Format papers as numbered entries accessed today.
pub fn bibliography(papers: &[Paper]) -> Result<String> {
    format_bibliography(papers, Local::now().date_naive())
}

/// `{n}. {title}. Available at: {url} (Accessed: {date}).`, one per paper,
/// separated by blank lines.
pub fn format_bibliography(papers: &[Paper], accessed: NaiveDate) -> Result<String> {
    if papers.is_empty() {
        return Err(SwipeError::InvalidInput("No papers provided".to_string()));
    }

    let accessed = accessed.format("%d %B %Y").to_string();

    Ok(papers
        .iter()
        .enumerate()
        .map(|(i, paper)| {
            let title = if paper.title.trim().is_empty() {
                UNKNOWN_TITLE
            } else {
                paper.title.as_str()
            };
            format!(
                "{}. {}. Available at: {} (Accessed: {}).",
                i + 1,
                title,
                paper.url,
                accessed
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n"))
}
