//! Paper discovery prompts.
//!
//! The user prompt asks for a strict `Title:` / `URL:` / `Description:` layout,
//! which is what the free-text extractor parses.

use super::fill_template;

/// System prompt for paper discovery
pub const SYSTEM_PROMPT: &str = "You are an academic research assistant. Find relevant peer-reviewed papers and provide their EXACT TITLES as they appear on the source page, full URLs, and brief descriptions. Never use generic names like 'Research Paper' or URLs as titles. Always extract the real paper title.";

/// User prompt template
/// Placeholders: {query}
pub const USER_PROMPT_TEMPLATE: &str = r#"Find recent academic research papers about: {query}

Focus on papers from trusted sources like:
- arxiv.org
- nature.com
- science.org
- ieee.org
- acm.org
- springer.com
- scholar.google.com

For each paper found, provide in this exact format:

Title: [ACTUAL PAPER TITLE FROM THE SOURCE]
URL: [full URL to the paper]
Description: [2-3 sentence description]

CRITICAL INSTRUCTIONS:
1. Use the ACTUAL TITLE from the paper (not the URL, not "Research Paper")
2. Look for the title in the page metadata, header, or citation
3. Each title should be descriptive and specific to the paper's content
4. Format each paper entry clearly with Title, URL, and Description labels

Provide at least 10 relevant papers."#;

/// Build user prompt for a research topic
pub fn build_user_prompt(query: &str) -> String {
    fill_template(USER_PROMPT_TEMPLATE, &[("query", query)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_user_prompt() {
        let prompt = build_user_prompt("graph neural networks");
        assert!(prompt.starts_with("Find recent academic research papers about: graph neural networks"));
        assert!(prompt.contains("Title: [ACTUAL PAPER TITLE FROM THE SOURCE]"));
        assert!(!prompt.contains("{query}"));
    }
}
