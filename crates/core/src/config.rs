//! Tunable thresholds for heading and title inference.
//!
//! Every knob has a documented default; a TOML file may override any subset
//! of them:
//!
//! ```toml
//! [heading]
//! min_heading_size = 11.0
//!
//! [title]
//! candidate_pool = 5
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid heuristics configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    pub heading: HeadingConfig,
    pub title: TitleConfig,
}

impl HeuristicConfig {
    /// Parse a TOML document. Absent tables and keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    /// A fragment larger than `body_size * size_ratio` is a heading.
    pub size_ratio: f32,
    /// Fragments below this size are never headings.
    pub min_heading_size: f32,
    /// Texts shorter than this (in characters) at or above the average size
    /// qualify as headings.
    pub short_text_limit: usize,
    /// Maximum vertical distance between two lines of one wrapped heading.
    pub merge_distance: f32,
    /// Stop merging once the accumulated heading reaches this many characters.
    pub merge_text_limit: usize,
    /// Headings of this many characters or fewer are discarded as noise.
    pub min_text_length: usize,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        HeadingConfig {
            size_ratio: 1.2,
            min_heading_size: 10.0,
            short_text_limit: 100,
            merge_distance: 30.0,
            merge_text_limit: 150,
            min_text_length: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    /// How many of the largest page-1 fragments are considered.
    pub candidate_pool: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// Lengths in `ideal_min_length..=ideal_max_length` earn the length bonus.
    pub ideal_min_length: usize,
    pub ideal_max_length: usize,
    /// Word counts in `min_words..=max_words` earn the word-count bonus.
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for TitleConfig {
    fn default() -> Self {
        TitleConfig {
            candidate_pool: 10,
            min_length: 5,
            max_length: 200,
            ideal_min_length: 10,
            ideal_max_length: 80,
            min_words: 2,
            max_words: 10,
        }
    }
}
