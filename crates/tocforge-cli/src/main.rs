// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tocforge — embed a table of contents into a PDF.
//
// Entry point.  Initialises logging, checks the toolchain, submits one
// pipeline run, and prints the terminal report.  Ctrl-C cancels the run
// (and the in-flight subprocess) instead of abandoning it.

mod entries;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::warn;

use tocforge_core::config::{ExtractFailurePolicy, ToolchainConfig};
use tocforge_core::error::Result;
use tocforge_core::types::{HeadingEntry, RunReport, RunStatus};
use tocforge_pipeline::TocService;

#[derive(Debug, Parser)]
#[command(
    name = "tocforge",
    version,
    about = "Embed a navigable table of contents into a PDF via the pdfxmeta/pdftocgen/pdftocio toolchain"
)]
struct Cli {
    /// Input PDF file
    input: PathBuf,

    /// Heading entry as LEVEL:PAGE:TITLE (repeatable)
    #[arg(short = 'e', long = "entry", value_name = "LEVEL:PAGE:TITLE")]
    entries: Vec<String>,

    /// File with one heading entry per line (# comments allowed)
    #[arg(short = 'f', long = "entries-file", value_name = "FILE")]
    entries_file: Option<PathBuf>,

    /// Skip headings whose extraction fails instead of aborting the run
    #[arg(long)]
    skip_failed_headings: bool,

    /// Toolchain config file (JSON); defaults are used when absent
    #[arg(long, value_name = "FILE", env = "TOCFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(report) if report.is_success() => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<RunReport> {
    let mut config = load_config(cli.config.as_deref())?;
    if cli.skip_failed_headings {
        config.extract_failure_policy = ExtractFailurePolicy::SkipAndWarn;
    }

    let entries = collect_entries(&cli)?;

    let service = TocService::new(config)?;
    let handle = service.submit(cli.input.clone(), entries)?;

    // Ctrl-C cancels the run; the report still arrives through the handle.
    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    let report = handle.wait().await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(report)
}

/// File entries first, then flag entries, preserving order within each.
fn collect_entries(cli: &Cli) -> Result<Vec<HeadingEntry>> {
    let mut list = Vec::new();
    if let Some(file) = &cli.entries_file {
        list.extend(entries::parse_file(file)?);
    }
    for spec in &cli.entries {
        list.push(entries::parse_spec(spec)?);
    }
    Ok(list)
}

fn load_config(path: Option<&Path>) -> Result<ToolchainConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(ToolchainConfig::default()),
    }
}

fn print_report(report: &RunReport) {
    match report.status {
        RunStatus::Done => {
            if let Some(output) = &report.output {
                println!("TOC embedded: {}", output.display());
            }
        }
        RunStatus::Cancelled => {
            eprintln!("run cancelled");
        }
        _ => {
            let stage = report
                .failed_stage
                .map(|s| s.to_string())
                .unwrap_or_else(|| "startup".into());
            let error = report.error.as_deref().unwrap_or("unknown error");
            eprintln!("run failed while {stage}: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_flags_and_entries() {
        let cli = Cli::parse_from([
            "tocforge",
            "report.pdf",
            "-e",
            "1:1:Introduction",
            "-e",
            "2:3:Background",
            "--skip-failed-headings",
            "--json",
        ]);
        assert_eq!(cli.input, PathBuf::from("report.pdf"));
        assert_eq!(cli.entries.len(), 2);
        assert!(cli.skip_failed_headings);
        assert!(cli.json);
    }

    #[test]
    fn entries_from_file_precede_flag_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("entries.txt");
        std::fs::write(&file, "1:1:From File\n").expect("write");

        let cli = Cli::parse_from([
            "tocforge",
            "report.pdf",
            "-f",
            file.to_str().expect("utf8 path"),
            "-e",
            "2:9:From Flag",
        ]);
        let entries = collect_entries(&cli).expect("collect");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title(), "From File");
        assert_eq!(entries[1].title(), "From Flag");
    }

    #[test]
    fn default_config_when_no_file_given() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config.extractor, "pdfxmeta");
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let config = ToolchainConfig {
            generator: "/opt/toolchain/pdftocgen".into(),
            ..ToolchainConfig::default()
        };
        std::fs::write(&path, serde_json::to_string(&config).expect("json")).expect("write");

        let loaded = load_config(Some(&path)).expect("load");
        assert_eq!(loaded.generator, "/opt/toolchain/pdftocgen");
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write");
        assert!(load_config(Some(&path)).is_err());
    }
}
