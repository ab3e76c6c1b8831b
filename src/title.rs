//! Title cleanup heuristics.
//!
//! Two pure utilities shared by extraction and enrichment:
//!
//! - [`normalize`] / [`clean_title`] repair a raw title string (labels, file
//!   extensions, separator runs, case, length).
//! - [`title_from_url`] / [`try_title_from_url`] derive a readable title from a
//!   URL path when no usable title exists.
//!
//! The `clean_*`/`try_*` variants return `None` for "unresolved"; the others
//! substitute [`PLACEHOLDER_TITLE`] for display.

use std::borrow::Cow;

/// Display value for a title that could not be determined
pub const PLACEHOLDER_TITLE: &str = "Research Paper";

const MAX_TITLE_CHARS: usize = 150;
const TRUNCATED_TITLE_CHARS: usize = 147;
const ELLIPSIS: &str = "...";
/// Upper bound on case-repair rounds
const MAX_CASE_PASSES: usize = 4;

const LABEL_PREFIXES: &[&str] = &["title:", "paper:", "article:"];
const FILE_EXTENSIONS: &[&str] = &[".pdf", ".html", ".htm"];

/// A path segment must be longer than this to be considered
const MIN_SEGMENT_CHARS: usize = 15;
/// A derived title must be longer than this to be accepted
const MIN_URL_TITLE_CHARS: usize = 20;
const MAX_URL_TITLE_CHARS: usize = 100;

/// Clean a raw title, falling back to [`PLACEHOLDER_TITLE`].
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(raw: &str) -> String {
    clean_title(raw).unwrap_or_else(|| PLACEHOLDER_TITLE.to_string())
}

/// Clean a raw title, returning `None` when nothing usable remains.
///
/// Strips `Title:`/`Paper:`/`Article:` labels and trailing `.pdf`/`.html`/`.htm`,
/// turns `__` and `---` runs into spaces, collapses whitespace, title-cases
/// single-case input and caps the result at 150 characters. URLs and the
/// placeholder itself count as "nothing usable".
pub fn clean_title(raw: &str) -> Option<String> {
    let mut title = raw.trim().to_string();

    // Each pass can expose another label or extension, so run to a fixed point.
    loop {
        let next = collapse_separators(strip_extensions(strip_labels(&title)));
        if next == title {
            break;
        }
        title = next;
    }

    if title.is_empty() || looks_like_url(&title) || is_placeholder(&title) {
        return None;
    }

    // Case is judged on the kept prefix only, or a second pass could disagree.
    title = truncate_title(title);

    // Letters such as `ß` expand when upper-cased and can leave the result
    // single-case again, so repair until the case settles.
    for _ in 0..MAX_CASE_PASSES {
        if !is_single_case(&title) {
            break;
        }
        let cased = truncate_title(title_case(&title));
        if cased == title {
            break;
        }
        title = cased;
    }

    Some(title)
}

/// True when the string starts with an `http://` or `https://` scheme.
pub fn looks_like_url(s: &str) -> bool {
    let s = s.trim_start();
    starts_with_ignore_case(s, "http://") || starts_with_ignore_case(s, "https://")
}

/// True for the placeholder title in any casing.
pub fn is_placeholder(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case(PLACEHOLDER_TITLE)
}

/// Derive a title from a URL, falling back to [`PLACEHOLDER_TITLE`].
pub fn title_from_url(url: &str) -> String {
    try_title_from_url(url).unwrap_or_else(|| PLACEHOLDER_TITLE.to_string())
}

/// Derive a title from the last descriptive path segment of a URL.
///
/// Segments are scanned from the end; the first one longer than 15 characters
/// that is not a scheme or `www` host and yields more than 20 characters of
/// title wins. The result is capped at 100 characters.
pub fn try_title_from_url(url: &str) -> Option<String> {
    url.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .find_map(title_from_segment)
}

fn title_from_segment(segment: &str) -> Option<String> {
    if segment.chars().count() <= MIN_SEGMENT_CHARS {
        return None;
    }
    if starts_with_ignore_case(segment, "http") || starts_with_ignore_case(segment, "www") {
        return None;
    }

    let decoded = urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| segment.to_string());
    let spaced = decoded.replace(['-', '_'], " ");
    let words = strip_url_suffix(&spaced)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let title = title_case(&words);

    if title.chars().count() > MIN_URL_TITLE_CHARS {
        Some(title.chars().take(MAX_URL_TITLE_CHARS).collect())
    } else {
        None
    }
}

/// Drop a file extension (and anything after it), then any query or fragment.
fn strip_url_suffix(s: &str) -> &str {
    // ASCII lowercasing keeps byte offsets aligned with `s`
    let lower = s.to_ascii_lowercase();
    let stem = FILE_EXTENSIONS
        .iter()
        .filter_map(|ext| lower.find(ext))
        .min()
        .map_or(s, |idx| &s[..idx]);
    stem.split(['?', '#']).next().unwrap_or(stem)
}

fn strip_labels(s: &str) -> &str {
    let mut rest = s.trim_start();
    'outer: loop {
        for prefix in LABEL_PREFIXES {
            if starts_with_ignore_case(rest, prefix) {
                rest = rest[prefix.len()..].trim_start();
                continue 'outer;
            }
        }
        return rest;
    }
}

fn strip_extensions(s: &str) -> &str {
    let mut rest = s.trim_end();
    'outer: loop {
        for ext in FILE_EXTENSIONS {
            if ends_with_ignore_case(rest, ext) {
                rest = rest[..rest.len() - ext.len()].trim_end();
                continue 'outer;
            }
        }
        return rest;
    }
}

/// `__+` and `---+` become a space, then whitespace runs collapse.
fn collapse_separators(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '_' || c == '-' {
            let run = chars[i..].iter().take_while(|&&x| x == c).count();
            let min_run = if c == '_' { 2 } else { 3 };
            if run >= min_run {
                out.push(' ');
            } else {
                out.extend(std::iter::repeat(c).take(run));
            }
            i += run;
        } else {
            out.push(c);
            i += 1;
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Has cased letters, and they are all lower-case or all upper-case.
fn is_single_case(s: &str) -> bool {
    let has_upper = s.chars().any(char::is_uppercase);
    let has_lower = s.chars().any(char::is_lowercase);
    has_upper != has_lower
}

/// Upper-case the first letter of each space-separated word, lower-case the rest.
fn title_case(s: &str) -> String {
    s.split(' ').map(capitalize_word).collect::<Vec<_>>().join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut capitalized = false;
    for c in word.chars() {
        if !capitalized && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            capitalized = true;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

fn truncate_title(title: String) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let mut truncated: String = title.chars().take(TRUNCATED_TITLE_CHARS).collect();
        truncated.push_str(ELLIPSIS);
        truncated
    } else {
        title
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn ends_with_ignore_case(s: &str, suffix: &str) -> bool {
    s.len()
        .checked_sub(suffix.len())
        .and_then(|start| s.get(start..))
        .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}
