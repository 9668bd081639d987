//! kuota-calc
//!
//! Calculates the resource quota a set of Kubernetes manifests needs,
//! including the extra pods rolling updates schedule. Works standalone or
//! as a kubectl plugin (`kubectl kuota-calc`).

mod calculate;
mod config;
mod output;
mod version;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use config::{CliConfig, LogFormat};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const EXAMPLES: &str = "Examples:
    # provide a simple/complex deployment by piping it to kuota-calc (used as kubectl plugin)
    cat deployment.yaml | kubectl kuota-calc

    # do the same, calling the binary directly with detailed output
    cat deployment.yaml | kuota-calc --detailed";

/// Calculate the resource quota needs of your deployment(s).
#[derive(Parser)]
#[command(name = "kuota-calc")]
#[command(author, about, long_about = None, after_help = EXAMPLES)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Manifest files to read ("-" for stdin); reads stdin when omitted
    pub files: Vec<PathBuf>,

    /// Enable detailed output
    #[arg(long)]
    pub detailed: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Report workloads that cannot be calculated and continue
    #[arg(long)]
    pub keep_going: bool,

    /// Path to a config file (default: ~/.config/kuota-calc/config.json)
    #[arg(long, env = "KUOTA_CALC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print version and exit
    #[arg(long)]
    pub version: bool,
}

impl Cli {
    /// Merge flags over the loaded configuration
    fn options(&self, config: &CliConfig) -> calculate::Options {
        calculate::Options {
            detailed: self.detailed || config.detailed,
            format: self.format.unwrap_or(config.format),
            keep_going: self.keep_going || config.keep_going,
        }
    }

    fn reads_stdin(&self) -> bool {
        self.files.is_empty() || self.files.iter().any(|f| f == Path::new("-"))
    }
}

fn init_tracing(debug: bool, format: LogFormat) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(io::stderr)).init(),
        LogFormat::Text => registry.with(fmt::layer().with_writer(io::stderr)).init(),
    }
}

fn binary_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "kuota-calc".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref())?;
    init_tracing(cli.debug, config.log_format);

    if cli.version {
        version::VersionInfo::from_build().write_to(&binary_name(), &mut io::stdout().lock())?;
        return Ok(());
    }

    // stdin must contain input
    if cli.reads_stdin() && io::stdin().is_terminal() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let options = cli.options(&config);
    debug!(detailed = options.detailed, keep_going = options.keep_going, "calculating resource quota");

    let mut sources = Vec::new();
    if cli.files.is_empty() {
        sources.push(calculate::Source::stdin()?);
    }
    for file in &cli.files {
        if file == Path::new("-") {
            sources.push(calculate::Source::stdin()?);
        } else {
            sources.push(calculate::Source::file(file)?);
        }
    }

    calculate::run(&options, &sources, &mut io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["kuota-calc", "--detailed", "--format", "json"]);
        let options = cli.options(&CliConfig::default());

        assert!(options.detailed);
        assert_eq!(options.format, output::OutputFormat::Json);
        assert!(!options.keep_going);
    }

    #[test]
    fn test_config_fills_unset_flags() {
        let cli = Cli::parse_from(["kuota-calc"]);
        let config = CliConfig {
            detailed: true,
            keep_going: true,
            format: output::OutputFormat::Json,
            ..Default::default()
        };
        let options = cli.options(&config);

        assert!(options.detailed);
        assert!(options.keep_going);
        assert_eq!(options.format, output::OutputFormat::Json);
    }

    #[test]
    fn test_files_and_stdin() {
        assert!(Cli::parse_from(["kuota-calc"]).reads_stdin());
        assert!(Cli::parse_from(["kuota-calc", "a.yaml", "-"]).reads_stdin());
        assert!(!Cli::parse_from(["kuota-calc", "a.yaml"]).reads_stdin());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
