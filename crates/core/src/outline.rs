use serde::{Deserialize, Serialize};

use crate::config::HeuristicConfig;
use crate::fragment::Fragment;
use crate::heading::{detect_headings, Heading, HeadingLevel};
use crate::title::extract_title;

/// Title used when page 1 yields no valid candidate.
pub const DEFAULT_TITLE: &str = "Untitled Document";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

impl From<Heading> for OutlineEntry {
    fn from(heading: Heading) -> Self {
        OutlineEntry {
            level: heading.level,
            text: heading.text,
            page: heading.page,
        }
    }
}

/// The per-document result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOutline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

/// Combine an extracted title with detected headings, keeping detection order.
pub fn assemble(title: Option<String>, headings: Vec<Heading>) -> DocumentOutline {
    DocumentOutline {
        title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        outline: headings.into_iter().map(OutlineEntry::from).collect(),
    }
}

/// Run title extraction and heading detection over one document.
pub fn build_outline(fragments: &[Fragment], config: &HeuristicConfig) -> DocumentOutline {
    let title = extract_title(fragments, &config.title);
    let headings = detect_headings(fragments, &config.heading);
    assemble(title, headings)
}
