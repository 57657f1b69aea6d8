use std::path::{Path, PathBuf};

use colored::Colorize;
use pdfoutline_core::outline::{build_outline, DocumentOutline};

use crate::config::Settings;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct ExtractOptions {
    /// Path to the PDF file
    pub path: PathBuf,
}

/// Decode one PDF and infer its title and outline.
///
/// Synchronous and self-contained, so batch workers can call it on a
/// blocking thread without sharing anything.
pub fn outline_document(path: &Path, settings: &Settings) -> Result<DocumentOutline, Error> {
    let fragments = pdf::extract_fragments_from_path(path, &settings.decode)
        .map_err(|e| Error::Decode(e.to_string()))?;

    let outline = build_outline(&fragments, &settings.heuristics);
    log::debug!(
        "{}: {} fragments, {} headings",
        path.display(),
        fragments.len(),
        outline.outline.len()
    );

    Ok(outline)
}

pub async fn run(options: ExtractOptions, global: crate::Global) -> Result<()> {
    let settings = Settings::from_global(&global)?;

    let path = options.path.clone();
    let outline = tokio::task::spawn_blocking(move || outline_document(&path, &settings))
        .await?
        .wrap_err_with(|| f!("Error processing {}", options.path.display()))?;

    if global.verbose {
        eprintln!(
            "{} {} ({} headings)",
            "Title:".bold(),
            outline.title.cyan(),
            outline.outline.len()
        );
    }

    println!("{}", serde_json::to_string_pretty(&outline)?);

    Ok(())
}
