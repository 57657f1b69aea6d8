use std::path::Path;

use thiserror::Error;

use pdfoutline_core::fragment::Fragment;
use parser::backend::{LopdfBackend, PdfBackend};
use parser::spans::{extract_page_spans, merge_runs, spans_to_fragments};

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod parser;

/// Pages past this many are not decoded unless configured otherwise.
pub const DEFAULT_MAX_PAGES: usize = 50;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub max_pages: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Decode PDF bytes into positioned text fragments, page by page.
///
/// The parsed document lives only for the duration of the call.
pub fn extract_fragments(bytes: &[u8], options: &DecodeOptions) -> Result<Vec<Fragment>, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    collect_fragments(&backend, options)
}

/// Read a PDF from disk and decode it with [`extract_fragments`].
pub fn extract_fragments_from_path(
    path: impl AsRef<Path>,
    options: &DecodeOptions,
) -> Result<Vec<Fragment>, PdfError> {
    let bytes = std::fs::read(path)?;
    extract_fragments(&bytes, options)
}

/// Walk the first `max_pages` pages of any backend in page order.
pub fn collect_fragments(
    backend: &dyn PdfBackend,
    options: &DecodeOptions,
) -> Result<Vec<Fragment>, PdfError> {
    let pages = backend.pages();
    if pages.len() > options.max_pages {
        log::debug!(
            "document has {} pages, decoding only the first {}",
            pages.len(),
            options.max_pages
        );
    }

    let mut fragments = Vec::new();
    for (&number, &page) in pages.iter().take(options.max_pages) {
        let spans = merge_runs(extract_page_spans(backend, page)?);
        let bounds = backend.page_bounds(page);
        fragments.extend(spans_to_fragments(spans, number as usize, bounds));
    }

    log::debug!("decoded {} fragments", fragments.len());
    Ok(fragments)
}
