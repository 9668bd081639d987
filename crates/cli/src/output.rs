//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use quota_lib::{ResourceUsage, Summary};
use serde::Deserialize;
use std::io::Write;
use tabled::{settings::Style, Table, Tabled};

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain totals, or a table with --detailed (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row of the per-workload breakdown
#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Replicas")]
    replicas: i32,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "MaxReplicas")]
    max_replicas: i32,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
}

impl From<&ResourceUsage> for UsageRow {
    fn from(usage: &ResourceUsage) -> Self {
        let details = &usage.details;
        Self {
            version: details.version.clone(),
            kind: details.kind.clone(),
            name: details.name.clone(),
            replicas: details.replicas,
            strategy: details.strategy.clone(),
            max_replicas: details.max_replicas,
            cpu: usage.cpu.to_string(),
            memory: usage.memory.to_string(),
        }
    }
}

/// Render a summary in the requested format
pub fn render<W: Write>(summary: &Summary, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, summary)?;
            writeln!(out)?;
        }
        OutputFormat::Table => match &summary.details {
            Some(details) => write_detailed(summary, details, out)?,
            None => write_totals(summary, out)?,
        },
    }

    Ok(())
}

/// Per-workload table followed by the totals
fn write_detailed<W: Write>(summary: &Summary, details: &[ResourceUsage], out: &mut W) -> Result<()> {
    let rows: Vec<UsageRow> = details.iter().map(UsageRow::from).collect();
    let table = Table::new(rows).with(Style::blank()).to_string();

    writeln!(out, "{}", table)?;
    writeln!(out, "\nTotal")?;
    write_totals(summary, out)
}

fn write_totals<W: Write>(summary: &Summary, out: &mut W) -> Result<()> {
    writeln!(out, "CPU: {}\nMemory: {}", summary.cpu, summary.memory)?;
    Ok(())
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}
