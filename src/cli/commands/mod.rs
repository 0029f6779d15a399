//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod scan;
mod search;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;
use crate::ocr::ExtractionMode;
use crate::scan::SearchPolicy;

#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "Search PDFs and scanned images for text")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Document root served over HTTP (overrides config file and environment)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Search a single PDF or image for a phrase
    Search {
        /// Document to search
        file: PathBuf,
        /// Text to look for (case-insensitive)
        query: String,
        /// Extraction mode: scanned (OCR) or text (embedded text layer)
        #[arg(short, long, default_value = "scanned")]
        mode: ExtractionMode,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search every PDF and image in a directory
    Scan {
        /// Directory to scan (not recursive)
        dir: PathBuf,
        /// Text to look for (case-insensitive)
        query: String,
        /// When to stop: all_matches, first_match_any_pdf, first_match_per_pdf
        #[arg(short, long, default_value = "all_matches")]
        policy: SearchPolicy,
        /// Extraction mode: scanned (OCR) or text (embedded text layer)
        #[arg(short, long, default_value = "scanned")]
        mode: ExtractionMode,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report whether a document has no usable text layer
    NeedsOcr {
        /// Document to inspect
        file: PathBuf,
    },

    /// Check that the external extraction tools are installed
    Check,

    /// Start the HTTP server
    Serve {
        /// Bind address: PORT, HOST, or HOST:PORT (default from config)
        bind: Option<String>,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref()).await?;
    if let Some(root) = cli.root {
        settings.document_root = root;
    }

    match cli.command {
        Commands::Search {
            file,
            query,
            mode,
            json,
        } => search::cmd_search(&settings, &file, &query, mode, json).await,
        Commands::Scan {
            dir,
            query,
            policy,
            mode,
            json,
        } => scan::cmd_scan(&settings, &dir, &query, policy, mode, json).await,
        Commands::NeedsOcr { file } => search::cmd_needs_ocr(&settings, &file).await,
        Commands::Check => check::cmd_check().await,
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_arguments() {
        let cli = Cli::try_parse_from([
            "docsearch",
            "-v",
            "scan",
            "docs",
            "needle",
            "--policy",
            "first-match-per-pdf",
            "--mode",
            "text",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Scan {
                dir, policy, mode, json, ..
            } => {
                assert_eq!(dir, PathBuf::from("docs"));
                assert_eq!(policy, SearchPolicy::FirstMatchPerPdf);
                assert_eq!(mode, ExtractionMode::Native);
                assert!(!json);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["docsearch", "search", "a.pdf", "x", "--mode", "fast"]).is_err());
    }
}
