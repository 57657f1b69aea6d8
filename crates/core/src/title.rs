//! Title selection from the first page.
//!
//! The largest, topmost fragments on page 1 are cleaned, validated against a
//! small stoplist and scored on length, capitalisation, digits, word count
//! and trailing punctuation. The best-scoring text wins.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::TitleConfig;
use crate::fragment::Fragment;
use crate::text::{char_len, clean_title_text};

/// Words that head a page but never name the document.
const STOPLIST: [&str; 5] = ["page", "contents", "index", "abstract", "introduction"];

#[derive(Debug, Clone, PartialEq)]
pub struct TitleCandidate {
    pub text: String,
    pub score: f32,
}

fn has_digit(text: &str) -> bool {
    static RE_DIGIT: OnceLock<Regex> = OnceLock::new();
    RE_DIGIT
        .get_or_init(|| Regex::new(r"\d").unwrap())
        .is_match(text)
}

/// Whether a cleaned candidate can be a title at all.
pub fn is_valid_title(text: &str, config: &TitleConfig) -> bool {
    static RE_DIGITS_ONLY: OnceLock<Regex> = OnceLock::new();
    let re_digits_only = RE_DIGITS_ONLY.get_or_init(|| Regex::new(r"^\d+$").unwrap());

    static RE_NUMBERED_LABEL: OnceLock<Regex> = OnceLock::new();
    let re_numbered_label = RE_NUMBERED_LABEL
        .get_or_init(|| Regex::new(r"^(chapter|section|part)\s+\d+$").unwrap());

    let len = char_len(text);
    if len < config.min_length || len > config.max_length {
        return false;
    }

    if re_digits_only.is_match(text) {
        return false;
    }

    let lower = text.to_lowercase();
    if STOPLIST.contains(&lower.as_str()) {
        return false;
    }

    !re_numbered_label.is_match(&lower)
}

/// Heuristic title score; higher is better.
pub fn score_title(text: &str, config: &TitleConfig) -> f32 {
    let mut score = 0.0;

    let len = char_len(text);
    if (config.ideal_min_length..=config.ideal_max_length).contains(&len) {
        score += 2.0;
    }

    if text.chars().next().is_some_and(char::is_uppercase) {
        score += 1.0;
    }

    if !has_digit(text) {
        score += 1.0;
    }

    let words = text.split_whitespace().count();
    if (config.min_words..=config.max_words).contains(&words) {
        score += 1.0;
    }

    if text.ends_with(['.', '!', '?']) {
        score -= 1.0;
    }

    score
}

/// Cleaned, validated and scored candidates drawn from page 1.
///
/// The pool is the `candidate_pool` largest fragments; equal sizes are
/// ordered top of the page first.
pub fn title_candidates(fragments: &[Fragment], config: &TitleConfig) -> Vec<TitleCandidate> {
    let mut first_page: Vec<&Fragment> = fragments.iter().filter(|f| f.page == 1).collect();
    first_page.sort_by(|a, b| {
        b.font_size
            .total_cmp(&a.font_size)
            .then_with(|| a.y.total_cmp(&b.y))
    });

    first_page
        .into_iter()
        .take(config.candidate_pool)
        .map(|f| clean_title_text(&f.text))
        .filter(|text| is_valid_title(text, config))
        .map(|text| TitleCandidate {
            score: score_title(&text, config),
            text,
        })
        .collect()
}

/// Ranking used to pick the winner: score first, then the lexicographically
/// larger text.
fn rank(a: &TitleCandidate, b: &TitleCandidate) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| a.text.cmp(&b.text))
}

/// Pick the document title, or `None` when page 1 offers no valid candidate.
pub fn extract_title(fragments: &[Fragment], config: &TitleConfig) -> Option<String> {
    title_candidates(fragments, config)
        .into_iter()
        .max_by(rank)
        .map(|candidate| candidate.text)
}
