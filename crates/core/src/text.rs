use std::sync::OnceLock;

use regex::Regex;

/// Replace every whitespace run with a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalise heading text and strip leading numbering such as `"1.2. "`.
pub fn clean_heading_text(text: &str) -> String {
    static RE_LEADING: OnceLock<Regex> = OnceLock::new();
    let re_leading = RE_LEADING.get_or_init(|| Regex::new(r"^[\d.\s]+").unwrap());

    let collapsed = collapse_whitespace(text);
    re_leading.replace(&collapsed, "").trim().to_string()
}

/// Normalise a title candidate, stripping numbering, dashes and dots from
/// both ends (`"1. Overview - 2"` -> `"Overview"`).
pub fn clean_title_text(text: &str) -> String {
    static RE_LEADING: OnceLock<Regex> = OnceLock::new();
    let re_leading = RE_LEADING.get_or_init(|| Regex::new(r"^[\d.\s\-]+").unwrap());

    static RE_TRAILING: OnceLock<Regex> = OnceLock::new();
    let re_trailing = RE_TRAILING.get_or_init(|| Regex::new(r"[\d.\s\-]+$").unwrap());

    let collapsed = collapse_whitespace(text);
    let stripped = re_leading.replace(&collapsed, "");
    re_trailing.replace(&stripped, "").trim().to_string()
}

/// Length in characters, not bytes.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
