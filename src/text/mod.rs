//! Text normalization for product descriptions and bullet points
//!
//! Turns raw marketplace text (often HTML fragments) into single-line plain
//! text. Text that carries no usable content comes back as an empty string,
//! which downstream code treats as "no content".

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

/// Minimum number of characters for text to be considered useful
pub const MIN_TEXT_LENGTH: usize = 3;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w]").expect("valid regex"));

/// Strip HTML markup, joining text nodes with a single space
pub fn clean_html(raw_html: &str) -> String {
    if raw_html.is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(raw_html);
    fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace runs into one space and trim
pub fn normalize_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Check whether text is long enough and not just a number
pub fn is_useful_text(text: &str, min_length: usize) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }

    // "12-34" and "1,000" count as numbers once punctuation is gone
    let stripped = NON_WORD.replace_all(text, "");
    let all_digits = !stripped.is_empty() && stripped.chars().all(char::is_numeric);

    !all_digits && trimmed.chars().count() >= min_length
}

/// Full cleaning pipeline: HTML strip, whitespace normalize, degenerate filter
pub fn clean_and_filter(text: &str) -> String {
    let text = normalize_text(&clean_html(text));
    if is_useful_text(&text, MIN_TEXT_LENGTH) {
        text
    } else {
        String::new()
    }
}
