//! Directory scan command.

use std::path::Path;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::ocr::ExtractionMode;
use crate::scan::SearchPolicy;
use crate::service::SearchService;

use super::search::print_matches;

/// Scan a local directory and print per-file results.
pub async fn cmd_scan(
    settings: &Settings,
    dir: &Path,
    query: &str,
    policy: SearchPolicy,
    mode: ExtractionMode,
    json: bool,
) -> anyhow::Result<()> {
    let service = SearchService::from_settings(settings);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Scanning {}...", dir.display()));

    let results = {
        let pb = pb.clone();
        let dir = dir.to_path_buf();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || {
            service.scan_path(&dir, &query, policy, mode, |file| {
                let name = file.file_name().unwrap_or(file.as_os_str());
                pb.set_message(format!("Searching {}", name.to_string_lossy()));
            })
        })
        .await?
    };
    pb.finish_and_clear();
    let results = results?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    let mut failed = 0;
    for result in &results {
        if let Some(ref error) = result.error {
            failed += 1;
            println!("{} {}: {}", style("✗").red(), result.filename, style(error).dim());
            continue;
        }
        println!(
            "{} {} ({} match(es))",
            style("✓").green(),
            style(&result.filename).bold(),
            result.matches.len()
        );
        print_matches(&result.matches);
    }

    let matched = results.len() - failed;
    println!();
    println!(
        "{} {} file(s) matched {:?} in {} [{}]",
        style("→").cyan(),
        matched,
        query,
        dir.display(),
        policy
    );
    if failed > 0 {
        println!("  {} {} file(s) could not be read", style("!").yellow(), failed);
    }
    Ok(())
}
