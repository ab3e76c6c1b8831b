//! Structured summary prompts.
//!
//! The model is asked for a single JSON object; see
//! [`crate::enrich`] for how the answer is parsed.

use super::fill_template;

/// System prompt for structured summaries
pub const SYSTEM_PROMPT: &str = "You are an expert academic research analyst. Provide CONCISE, structured summaries in JSON format. Keep responses brief and under 200 words total.";

/// User prompt template
/// Placeholders: {title}, {title_json}, {url}, {description}, {query}
pub const USER_PROMPT_TEMPLATE: &str = r#"Analyze this academic paper and provide a BRIEF structured summary in JSON format.
KEEP IT CONCISE - each field should be 1-2 sentences MAX.

Title: {title}
URL: {url}
Description: {description}

Original research query: {query}

Create a JSON object with these exact fields (KEEP BRIEF):
{
    "title": "{title_json}",
    "key_findings": "1-2 sentences about main findings",
    "methodology": "1 sentence about research methods",
    "limitations": "1 sentence about limitations",
    "summary": "2 sentences overall summary",
    "relevance_score": 85,
    "authenticity_score": 90
}

IMPORTANT: Keep each field SHORT and CONCISE. Total response should be under 200 words.

For relevance_score (0-100): How relevant is this paper to "{query}"?
For authenticity_score (0-100): How credible is this source?

Return ONLY valid JSON, no other text."#;

const NO_DESCRIPTION: &str = "No description available";

/// Build user prompt; a missing snippet renders as "No description available".
pub fn build_user_prompt(title: &str, url: &str, snippet: Option<&str>, query: &str) -> String {
    // Title is user-influenced text embedded inside a JSON example
    let title_in_json = title.replace('\\', "\\\\").replace('"', "\\\"");
    fill_template(
        USER_PROMPT_TEMPLATE,
        &[
            ("title", title),
            ("title_json", title_in_json.as_str()),
            ("url", url),
            ("description", snippet.unwrap_or(NO_DESCRIPTION)),
            ("query", query),
        ],
    )
}
