//! Cross-paper conclusion prompts.

use super::fill_template;

/// System prompt for conclusion synthesis
pub const SYSTEM_PROMPT: &str = "You are an expert academic writer. Synthesize multiple research papers into a cohesive summary that helps students understand the research landscape.";

/// User prompt template
/// Placeholders: {count}, {papers}
pub const USER_PROMPT_TEMPLATE: &str = r#"Based on these {count} research papers, write a comprehensive summary
that synthesizes the research topic (2-3 paragraphs):

1. Provide an overview of the research area and what these papers collectively explore
2. Identify common themes, methodologies, and key insights across the papers
3. Note the overall significance and future directions in this field

Papers reviewed:
{papers}

Write a cohesive academic summary that gives students a strong understanding of the
overall research landscape on this topic. Keep it informative but accessible.

IMPORTANT:
- Do NOT include citations like [1], [2], etc.
- Do NOT use LaTeX formatting or special characters
- Do NOT use markdown formatting (**, ***, __, etc.)
- Write in plain text paragraphs only
- Make it readable and clear
- Use paragraphs if possible"#;

/// Build user prompt from pre-rendered paper entries
pub fn build_user_prompt(count: usize, papers_text: &str) -> String {
    let count = count.to_string();
    fill_template(USER_PROMPT_TEMPLATE, &[("count", count.as_str()), ("papers", papers_text)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_user_prompt() {
        let prompt = build_user_prompt(2, "Paper 1: A\n\nPaper 2: B");
        assert!(prompt.starts_with("Based on these 2 research papers"));
        assert!(prompt.contains("Paper 2: B"));
        assert!(prompt.contains("Do NOT include citations"));
    }
}
