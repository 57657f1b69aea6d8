use std::path::Path;

use pdf::DecodeOptions;
use pdfoutline_core::config::HeuristicConfig;

use crate::prelude::*;

/// Everything a worker needs to turn one PDF into an outline.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub heuristics: HeuristicConfig,
    pub decode: DecodeOptions,
}

impl Settings {
    pub fn from_global(global: &crate::Global) -> Result<Self> {
        let heuristics = match &global.config {
            Some(path) => load_heuristics(path)?,
            None => HeuristicConfig::default(),
        };

        Ok(Settings {
            heuristics,
            decode: DecodeOptions {
                max_pages: global.max_pages,
            },
        })
    }
}

/// Read a heuristics override file. Keys it leaves out keep their defaults.
pub fn load_heuristics(path: &Path) -> Result<HeuristicConfig> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| f!("Failed to read config file {}", path.display()))?;

    let config =
        HeuristicConfig::from_toml_str(&raw).map_err(|e| Error::Config(e.to_string()))?;
    log::debug!("loaded heuristics from {}: {:?}", path.display(), config);

    Ok(config)
}
