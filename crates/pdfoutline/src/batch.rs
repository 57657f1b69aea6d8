//! Directory batch processing.
//!
//! Every `*.pdf` directly inside the input directory is decoded on its own
//! blocking worker; at most `jobs` run at once. A document's JSON is written
//! only once it has been fully processed, and a failing document never stops
//! the others.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::extract::outline_document;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct BatchOptions {
    /// Directory scanned for PDF files
    #[arg(long, env = "PDFOUTLINE_INPUT", default_value = "input")]
    pub input: PathBuf,

    /// Directory receiving one JSON file per processed PDF
    #[arg(long, env = "PDFOUTLINE_OUTPUT", default_value = "output")]
    pub output: PathBuf,

    /// Documents processed concurrently (default: available parallelism)
    #[arg(short, long, env = "PDFOUTLINE_JOBS")]
    pub jobs: Option<usize>,

    /// Print a per-document summary table when done
    #[arg(long)]
    pub summary: bool,
}

/// What one successful document produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub output: String,
    pub title: String,
    pub headings: usize,
}

#[derive(Debug)]
pub struct DocumentReport {
    pub name: String,
    pub outcome: Result<Processed, Error>,
}

/// Regular files directly inside `dir` with a `pdf` extension in any case,
/// sorted by path.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .wrap_err_with(|| f!("Failed to read input directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// `<output_dir>/<stem>.json` for an input PDF.
pub fn output_path(output_dir: &Path, pdf: &Path) -> PathBuf {
    let stem = pdf.file_stem().unwrap_or(pdf.as_os_str());
    let mut target = output_dir.join(stem);
    target.set_extension("json");
    target
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Write through a temporary file in `dir` renamed onto `target`, so an
/// interrupted write never leaves a truncated file behind.
fn write_atomically(dir: &Path, target: &Path, contents: &[u8]) -> Result<(), Error> {
    let write_error = |e: &dyn std::fmt::Display| Error::Write(f!("{}: {}", target.display(), e));

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_error(&e))?;
    file.write_all(contents).map_err(|e| write_error(&e))?;
    file.persist(target).map_err(|e| write_error(&e.error))?;

    Ok(())
}

fn process_one(pdf: &Path, output_dir: &Path, settings: &Settings) -> Result<Processed, Error> {
    let outline = outline_document(pdf, settings)?;
    let json = serde_json::to_string_pretty(&outline).map_err(|e| Error::Generic(e.to_string()))?;

    let target = output_path(output_dir, pdf);
    write_atomically(output_dir, &target, json.as_bytes())?;

    Ok(Processed {
        output: display_name(&target),
        title: outline.title,
        headings: outline.outline.len(),
    })
}

/// Process `files` with at most `jobs` documents in flight. Reports come
/// back in completion order.
pub async fn process_all(
    files: Vec<PathBuf>,
    output_dir: &Path,
    settings: Arc<Settings>,
    jobs: usize,
    bar: &ProgressBar,
    verbose: bool,
) -> Vec<DocumentReport> {
    let mut pending = stream::iter(files.into_iter().map(|pdf| {
        let settings = Arc::clone(&settings);
        let output_dir = output_dir.to_path_buf();
        async move {
            let name = display_name(&pdf);
            let outcome =
                tokio::task::spawn_blocking(move || process_one(&pdf, &output_dir, &settings))
                    .await
                    .unwrap_or_else(|e| Err(Error::Generic(f!("worker failed: {}", e))));
            DocumentReport { name, outcome }
        }
    }))
    .buffer_unordered(jobs.max(1));

    let mut reports = Vec::new();
    while let Some(report) = pending.next().await {
        bar.suspend(|| print_report(&report, verbose));
        bar.set_message(report.name.clone());
        bar.inc(1);
        reports.push(report);
    }

    reports
}

fn print_report(report: &DocumentReport, verbose: bool) {
    match &report.outcome {
        Ok(processed) => {
            println!(
                "{} {} -> {}",
                "Processed:".green(),
                report.name,
                processed.output
            );
            if verbose {
                println!(
                    "  {} {} ({} headings)",
                    "Title:".bold(),
                    processed.title,
                    processed.headings
                );
            }
        }
        Err(e) => {
            log::warn!("Error processing {}: {}", report.name, e);
            eprintln!("{} {}: {}", "Error processing".red(), report.name, e);
        }
    }
}

fn progress_bar(len: usize, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn print_summary(reports: &[DocumentReport]) {
    let mut rows: Vec<&DocumentReport> = reports.iter().collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    let mut table = new_table();
    table.add_row(prettytable::row!["File", "Status", "Headings", "Title"]);
    for report in rows {
        match &report.outcome {
            Ok(processed) => table.add_row(prettytable::row![
                report.name,
                "ok",
                processed.headings,
                processed.title
            ]),
            Err(e) => table.add_row(prettytable::row![report.name, "failed", "-", e]),
        };
    }
    table.printstd();
}

pub async fn run(options: BatchOptions, global: crate::Global) -> Result<()> {
    let start = Instant::now();
    let settings = Arc::new(Settings::from_global(&global)?);

    let files = list_pdfs(&options.input)?;
    std::fs::create_dir_all(&options.output)
        .wrap_err_with(|| f!("Failed to create output directory {}", options.output.display()))?;

    let jobs = options.jobs.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    log::info!(
        "processing {} PDF files from {} with {} workers",
        files.len(),
        options.input.display(),
        jobs
    );

    let bar = progress_bar(files.len(), global.verbose);
    let reports = process_all(
        files,
        &options.output,
        settings,
        jobs,
        &bar,
        global.verbose,
    )
    .await;
    bar.finish_and_clear();

    let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
    log::info!(
        "{} documents processed, {} failed",
        reports.len() - failed,
        failed
    );

    if options.summary {
        print_summary(&reports);
    }

    println!(
        "Processing completed in {:.2}s",
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf::fixtures::{document, line};

    fn global() -> crate::Global {
        crate::Global {
            verbose: false,
            config: None,
            max_pages: pdf::DEFAULT_MAX_PAGES,
        }
    }

    fn sample_pdf(title: &str) -> Vec<u8> {
        document(&[&[
            line(title, 24.0, 720.0),
            line("Body text that keeps going for a while.", 10.0, 680.0),
            line("More body text on the following line.", 10.0, 666.0),
        ]])
    }

    #[test]
    fn test_list_pdfs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "A.PDF", "notes.txt", "c.Pdf", "pdf"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let names: Vec<String> = list_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| display_name(p))
            .collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf", "c.Pdf"]);
    }

    #[test]
    fn test_list_pdfs_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_pdfs(&dir.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("Failed to read input directory"));
    }

    #[test]
    fn test_output_path_uses_stem() {
        assert_eq!(
            output_path(Path::new("out"), Path::new("in/Annual Report.v2.PDF")),
            PathBuf::from("out/Annual Report.v2.json")
        );
    }

    #[tokio::test]
    async fn test_process_all_isolates_failures() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("good.pdf"), sample_pdf("Caching in Practice")).unwrap();
        std::fs::write(input.path().join("broken.pdf"), b"not a pdf at all").unwrap();

        let files = list_pdfs(input.path()).unwrap();
        let mut reports = process_all(
            files,
            output.path(),
            Arc::new(Settings::default()),
            2,
            &ProgressBar::hidden(),
            false,
        )
        .await;
        reports.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "broken.pdf");
        assert!(matches!(reports[0].outcome, Err(Error::Decode(_))));
        assert_eq!(
            reports[1].outcome.as_ref().unwrap(),
            &Processed {
                output: "good.json".to_string(),
                title: "Caching in Practice".to_string(),
                headings: 1,
            }
        );

        assert!(output.path().join("good.json").exists());
        assert!(!output.path().join("broken.json").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_output() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let pdf = input.path().join("good.pdf");
        std::fs::write(&pdf, sample_pdf("Caching in Practice")).unwrap();
        // A directory squatting on the target name makes the final rename fail.
        std::fs::create_dir(output.path().join("good.json")).unwrap();

        let err = process_one(&pdf, output.path(), &Settings::default()).unwrap_err();
        assert!(matches!(err, Error::Write(_)));

        let entries: Vec<String> = std::fs::read_dir(output.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["good.json"]);
        assert!(output.path().join("good.json").is_dir());
    }

    #[test]
    fn test_successful_write_replaces_previous_output() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let pdf = input.path().join("guide.pdf");
        std::fs::write(&pdf, sample_pdf("Caching in Practice")).unwrap();
        std::fs::write(output.path().join("guide.json"), "stale").unwrap();

        process_one(&pdf, output.path(), &Settings::default()).unwrap();

        let written = std::fs::read_to_string(output.path().join("guide.json")).unwrap();
        assert!(written.contains("\"Caching in Practice\""));
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_written_json_shape() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("guide.pdf"), sample_pdf("Caching in Practice")).unwrap();

        let files = list_pdfs(input.path()).unwrap();
        process_all(
            files,
            output.path(),
            Arc::new(Settings::default()),
            1,
            &ProgressBar::hidden(),
            false,
        )
        .await;

        let written = std::fs::read_to_string(output.path().join("guide.json")).unwrap();
        assert!(written.starts_with("{\n  \"title\""));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&written).unwrap(),
            serde_json::json!({
                "title": "Caching in Practice",
                "outline": [{ "level": "H1", "text": "Caching in Practice", "page": 1 }]
            })
        );
    }

    #[tokio::test]
    async fn test_run_creates_output_and_survives_corrupt_files() {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("input");
        let output = root.path().join("nested").join("output");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("one.pdf"), sample_pdf("First Document")).unwrap();
        std::fs::write(input.join("two.PDF"), b"garbage").unwrap();

        let options = BatchOptions {
            input,
            output: output.clone(),
            jobs: Some(2),
            summary: true,
        };
        run(options, global()).await.unwrap();

        let mut written: Vec<String> = std::fs::read_dir(&output)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        assert_eq!(written, vec!["one.json"]);
    }

    #[tokio::test]
    async fn test_run_fails_on_missing_input() {
        let root = tempfile::tempdir().unwrap();
        let options = BatchOptions {
            input: root.path().join("absent"),
            output: root.path().join("output"),
            jobs: None,
            summary: false,
        };
        assert!(run(options, global()).await.is_err());
    }

    #[tokio::test]
    async fn test_run_with_empty_directory() {
        let root = tempfile::tempdir().unwrap();
        let options = BatchOptions {
            input: root.path().to_path_buf(),
            output: root.path().join("output"),
            jobs: None,
            summary: false,
        };
        run(options, global()).await.unwrap();
        assert!(root.path().join("output").is_dir());
    }
}
