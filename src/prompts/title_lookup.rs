//! Title lookup prompts, used when extraction could not find a real title.

use super::fill_template;

/// System prompt for title lookup
pub const SYSTEM_PROMPT: &str =
    "You extract paper titles. Respond with ONLY the paper title, nothing else.";

/// User prompt template
/// Placeholders: {url}, {snippet}
pub const USER_PROMPT_TEMPLATE: &str = r#"Based on this URL: {url}
And this description: {snippet}

What is the actual title of this research paper? Provide ONLY the title, nothing else."#;

pub fn build_user_prompt(url: &str, snippet: &str) -> String {
    fill_template(USER_PROMPT_TEMPLATE, &[("url", url), ("snippet", snippet)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_user_prompt() {
        let prompt = build_user_prompt("https://arxiv.org/abs/1234", "A study of ranking.");
        assert!(prompt.contains("URL: https://arxiv.org/abs/1234"));
        assert!(prompt.contains("description: A study of ranking."));
    }
}
