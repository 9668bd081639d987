//! Configuration management for the CLI

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `KUOTA_CALC_DETAILED=true`
const ENV_PREFIX: &str = "KUOTA_CALC";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// CLI configuration
///
/// Layered from the config file and `KUOTA_CALC_*` environment variables;
/// command-line flags are applied on top by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Print the per-workload table
    pub detailed: bool,
    /// Default output format
    pub format: OutputFormat,
    /// Report calculation failures and continue instead of aborting
    pub keep_going: bool,
    /// Format of log lines on stderr
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Load configuration. An explicit `path` must exist; the default
    /// location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Some((path.to_path_buf(), true)),
            None => Self::config_path().map(|p| (p, false)),
        };

        let mut builder = config::Config::builder();
        if let Some((path, required)) = file {
            builder = builder.add_source(config::File::from(path).required(required));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Default configuration file path
    fn config_path() -> Option<PathBuf> {
        let home = dirs_next::home_dir()?;
        Some(home.join(".config").join("kuota-calc").join("config.json"))
    }
}
