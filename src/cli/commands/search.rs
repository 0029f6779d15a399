//! Single-document commands.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::ocr::ExtractionMode;
use crate::search::MatchRecord;
use crate::service::SearchService;

/// Search one local document and print its matches.
pub async fn cmd_search(
    settings: &Settings,
    file: &Path,
    query: &str,
    mode: ExtractionMode,
    json: bool,
) -> anyhow::Result<()> {
    let service = SearchService::from_settings(settings);
    let file = file.to_path_buf();
    let query = query.to_string();

    let response =
        tokio::task::spawn_blocking(move || service.search_path(&file, &query, mode)).await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.matches.is_empty() {
        println!(
            "{} No matches for {:?} in {} ({} mode)",
            style("○").yellow(),
            response.query,
            response.filename,
            response.mode
        );
        return Ok(());
    }

    println!(
        "{} {} match(es) for {:?} in {} ({} mode)",
        style("✓").green(),
        response.matches.len(),
        response.query,
        style(&response.filename).bold(),
        response.mode
    );
    print_matches(&response.matches);
    Ok(())
}

/// Report whether a local document needs OCR.
pub async fn cmd_needs_ocr(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let service = SearchService::from_settings(settings);
    let file = file.to_path_buf();

    let response = tokio::task::spawn_blocking(move || service.needs_ocr_path(&file)).await??;

    if response.needs_ocr {
        println!(
            "{} {} has no usable text layer; use --mode scanned",
            style("!").yellow(),
            response.filename
        );
    } else {
        println!(
            "{} {} has embedded text; --mode text will work",
            style("✓").green(),
            response.filename
        );
    }
    Ok(())
}

pub(super) fn print_matches(matches: &[MatchRecord]) {
    for m in matches {
        println!(
            "  {} {}",
            style(format!("p{}:{}", m.page, m.position)).cyan(),
            highlight(&m.context, &m.matched_text)
        );
    }
}

/// Bold the first occurrence of `matched` inside `context`.
fn highlight(context: &str, matched: &str) -> String {
    match context.find(matched) {
        Some(at) => format!(
            "{}{}{}",
            &context[..at],
            style(matched).bold().yellow(),
            &context[at + matched.len()..]
        ),
        None => context.to_string(),
    }
}
