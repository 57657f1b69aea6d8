//! Heading detection over a decoded fragment stream.
//!
//! PDF carries no semantic heading markup, so headings are inferred from
//! font-size statistics and a handful of textual patterns:
//!
//! ```text
//! fragments -> classify -> assign level -> clean -> merge wrapped lines -> drop noise
//! ```
//!
//! Every function here is pure; detection order is preserved end to end.

use std::fmt;
use std::sync::OnceLock;

use regex::RegexSet;
use serde::{Deserialize, Serialize};

use crate::config::HeadingConfig;
use crate::fragment::Fragment;
use crate::text::{char_len, clean_heading_text};

/// Coarse heading rank derived from the font-size ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Map a 0-based rank among the distinct font sizes to a level. Anything
    /// past the third size collapses into `H3`.
    pub fn from_rank(rank: usize) -> Self {
        match rank {
            0 => HeadingLevel::H1,
            1 => HeadingLevel::H2,
            _ => HeadingLevel::H3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected heading.
///
/// `font_size` and `y` describe the first fragment of the heading and are
/// only needed while merging wrapped lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
    pub font_size: f32,
    pub y: f32,
}

/// Number of distinct sizes that receive their own level.
const RANKED_LEVELS: usize = 3;

// ---------------------------------------------------------------------------
// Font statistics
// ---------------------------------------------------------------------------

/// Arithmetic mean of all fragment font sizes, `0.0` for no fragments.
pub fn average_size(fragments: &[Fragment]) -> f32 {
    if fragments.is_empty() {
        return 0.0;
    }
    let total: f32 = fragments.iter().map(|f| f.font_size).sum();
    total / fragments.len() as f32
}

/// The most frequent exact font size, approximating the body text size.
///
/// Counts are accumulated in input order and the winner is only replaced
/// when another size strictly exceeds its count, so among tied sizes the one
/// that reached the maximum first wins. This is not the first-seen size:
/// for sizes `12, 14, 14, 12` the body size is 14, because 14 is first to
/// reach a count of two.
pub fn body_size(fragments: &[Fragment]) -> Option<f32> {
    let mut counts: Vec<(f32, usize)> = Vec::new();
    let mut best: Option<(f32, usize)> = None;

    for fragment in fragments {
        let size = fragment.font_size;
        let count = match counts.iter_mut().find(|(s, _)| *s == size) {
            Some(entry) => {
                entry.1 += 1;
                entry.1
            }
            None => {
                counts.push((size, 1));
                1
            }
        };

        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((size, count));
        }
    }

    best.map(|(size, _)| size)
}

/// Distinct font sizes, largest first.
pub fn distinct_sizes(fragments: &[Fragment]) -> Vec<f32> {
    let mut sizes: Vec<f32> = Vec::new();
    for fragment in fragments {
        if !sizes.contains(&fragment.font_size) {
            sizes.push(fragment.font_size);
        }
    }
    sizes.sort_by(|a, b| b.total_cmp(a));
    sizes
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Whether `text` looks like a heading regardless of its size: numbered
/// sections, all-caps lines, `Chapter 3`, `Part IV` and similar.
pub fn matches_heading_pattern(text: &str) -> bool {
    static PATTERNS: OnceLock<RegexSet> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        RegexSet::new([
            r"^\d+\.?\s+[A-Z]",
            r"^[A-Z][A-Z\s]{2,}$",
            r"^\d+\.\d+\.?\s+",
            r"^Chapter\s+\d+",
            r"^Section\s+\d+",
            r"^Part\s+[IVX]+",
        ])
        .unwrap()
    });

    patterns.is_match(text.trim())
}

fn is_heading(fragment: &Fragment, body: f32, average: f32, config: &HeadingConfig) -> bool {
    if fragment.font_size < config.min_heading_size {
        return false;
    }

    if fragment.font_size > body * config.size_ratio {
        return true;
    }

    if matches_heading_pattern(&fragment.text) {
        return true;
    }

    char_len(&fragment.text) < config.short_text_limit && fragment.font_size >= average
}

fn level_for(font_size: f32, ranked: &[f32]) -> HeadingLevel {
    ranked
        .iter()
        .take(RANKED_LEVELS)
        .position(|&s| s == font_size)
        .map(HeadingLevel::from_rank)
        .unwrap_or(HeadingLevel::H3)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Detect headings in a document's fragments, in encounter order.
pub fn detect_headings(fragments: &[Fragment], config: &HeadingConfig) -> Vec<Heading> {
    let Some(body) = body_size(fragments) else {
        return Vec::new();
    };
    let average = average_size(fragments);
    let ranked = distinct_sizes(fragments);

    let candidates: Vec<Heading> = fragments
        .iter()
        .filter(|f| is_heading(f, body, average, config))
        .map(|f| Heading {
            level: level_for(f.font_size, &ranked),
            text: clean_heading_text(&f.text),
            page: f.page,
            font_size: f.font_size,
            y: f.y,
        })
        .collect();

    filter_noise(merge_multiline(candidates, config), config)
}

/// Join headings that wrap over several lines.
///
/// A heading is appended to the one being accumulated when both sit on the
/// same page at the same level, the next line starts within
/// `merge_distance` of the accumulated heading's first line, and the
/// accumulated text is still shorter than `merge_text_limit`.
pub fn merge_multiline(headings: Vec<Heading>, config: &HeadingConfig) -> Vec<Heading> {
    let mut merged: Vec<Heading> = Vec::with_capacity(headings.len());
    let mut iter = headings.into_iter();

    let Some(mut current) = iter.next() else {
        return merged;
    };

    for next in iter {
        let joins = current.page == next.page
            && (current.y - next.y).abs() < config.merge_distance
            && current.level == next.level
            && char_len(&current.text) < config.merge_text_limit;

        if joins {
            current.text.push(' ');
            current.text.push_str(&next.text);
        } else {
            merged.push(std::mem::replace(&mut current, next));
        }
    }

    merged.push(current);
    merged
}

/// Drop headings that are too short or look like bullets or code.
pub fn filter_noise(headings: Vec<Heading>, config: &HeadingConfig) -> Vec<Heading> {
    headings
        .into_iter()
        .filter_map(|mut heading| {
            let trimmed = heading.text.trim();
            let noisy = char_len(trimmed) <= config.min_text_length
                || trimmed.starts_with(['\u{2022}', '-', '*'])
                || trimmed.ends_with([';', '{', '}', '(', ')']);
            if noisy {
                return None;
            }
            heading.text = trimmed.to_string();
            Some(heading)
        })
        .collect()
}
