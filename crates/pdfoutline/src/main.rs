use crate::prelude::*;
use clap::Parser;

mod batch;
mod config;
mod error;
mod extract;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Infer the title and heading outline of PDF documents"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "PDFOUTLINE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,

    /// TOML file overriding the heading and title heuristics
    #[clap(long, env = "PDFOUTLINE_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Number of pages decoded per document
    #[clap(
        long,
        env = "PDFOUTLINE_MAX_PAGES",
        global = true,
        default_value_t = pdf::DEFAULT_MAX_PAGES
    )]
    max_pages: usize,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Print the outline of a single PDF as JSON
    Extract(crate::extract::ExtractOptions),

    /// Write one JSON outline per PDF found in a directory
    Batch(crate::batch::BatchOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Extract(options) => crate::extract::run(options, app.global).await,
        SubCommands::Batch(options) => crate::batch::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
