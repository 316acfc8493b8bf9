//! Text helpers shared by the field extractors.

use regex::Regex;
use scraper::ElementRef;
use std::sync::OnceLock;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static OPEN_PAREN_RE: OnceLock<Regex> = OnceLock::new();
static CLOSE_PAREN_RE: OnceLock<Regex> = OnceLock::new();
static DOI_PARAM_RE: OnceLock<Regex> = OnceLock::new();

/// Visible text of an element with every text node trimmed and empty nodes
/// dropped, concatenated without separators.
pub fn stripped_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalize author/affiliation text into period-delimited segments.
///
/// Substitutions run in a fixed order: email tokens first, then opening and
/// closing parentheses. Running the parenthesis rules first would split a
/// parenthesized email and leave part of it behind.
pub fn clean_authors(text: &str) -> String {
    let email = EMAIL_RE.get_or_init(|| Regex::new(r"\s*email:\S+").expect("valid regex"));
    let open = OPEN_PAREN_RE.get_or_init(|| Regex::new(r"\s*\(").expect("valid regex"));
    let close = CLOSE_PAREN_RE.get_or_init(|| Regex::new(r"\)\s*").expect("valid regex"));

    let text = email.replace_all(text, ".");
    let text = open.replace_all(&text, ".");
    close.replace_all(&text, ".").into_owned()
}

/// Value of a single-quoted `doi: '...'` entry in a script body
pub(crate) fn quoted_doi(body: &str) -> Option<String> {
    let doi = DOI_PARAM_RE.get_or_init(|| Regex::new(r"doi\s*:\s*'([^']+)'").expect("valid regex"));
    doi.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
