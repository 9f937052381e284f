//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod handlers;
pub mod output;
pub mod parse;

use std::path::Path;

use actimp_core::ImporterConfig;
use tracing::debug;

/// Load the configuration named on the command line, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ImporterConfig> {
    match config_path {
        Some(path) => {
            debug!("Loading configuration from {}", path);
            Ok(ImporterConfig::from_file(Path::new(path))?)
        }
        None => Ok(ImporterConfig::default()),
    }
}
