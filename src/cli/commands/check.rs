//! Tool availability check.

use console::style;

use crate::ocr::{OcrBackend, PdfBackend, PopplerBackend, TesseractBackend, TextExtractor};

/// Report which external extraction tools are installed.
pub async fn cmd_check() -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tool Status").bold());
    println!("{}", "-".repeat(50));

    let tools = TextExtractor::check_tools();
    let mut all_found = true;

    for (tool, available) in &tools {
        let status = if *available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    println!("\n{}", style("Backends:").cyan());
    let poppler = PopplerBackend::new();
    let tesseract = TesseractBackend::new();
    let backends: [(&str, bool, String); 2] = [
        (poppler.name(), poppler.is_available(), poppler.availability_hint()),
        (tesseract.name(), tesseract.is_available(), tesseract.availability_hint()),
    ];
    for (name, available, hint) in backends {
        if available {
            println!("  {:<15} {}", name, style("✓ available").green());
        } else {
            println!("  {:<15} {}", name, style("✗ not available").red());
            println!("                  {}", style(hint).dim());
        }
    }

    println!();
    if all_found {
        println!("{} All extraction tools are available", style("✓").green());
    } else {
        println!(
            "{} Some tools are missing. Install poppler-utils and tesseract-ocr.",
            style("!").yellow()
        );
    }

    Ok(())
}
