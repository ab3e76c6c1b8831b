//! Prompt module for LLM-based operations.
//!
//! This module provides modular prompt templates for each model call the
//! pipeline makes: paper discovery, title lookup, structured summary and
//! cross-paper conclusion.

pub mod conclusion;
pub mod search;
pub mod summary;
pub mod title_lookup;

/// Substitute `{name}` placeholders in one pass.
///
/// Inserted values are never rescanned, so caller text that happens to contain
/// `{query}` or `{url}` is kept literally. Braces that do not name a known
/// placeholder (JSON examples) are left alone.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values.iter().find(|(name, _)| {
            tail.strip_prefix(name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
