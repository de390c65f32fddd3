//! Inspect command - show how a PDF statement is read.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use riskscan_core::StatementEngine;

use super::load_config;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// PDF statement
    #[arg(required = true)]
    input: PathBuf,

    /// Only print the first N lines
    #[arg(short = 'n', long)]
    lines: Option<usize>,
}

pub async fn run(args: InspectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let bytes = fs::read(&args.input)?;
    let engine = StatementEngine::new(config);
    let pdf = engine.read_pdf_lines(&bytes)?;

    println!("{} {} page(s), {} line(s)", style("ℹ").blue(), pdf.pages, pdf.lines.len());
    if pdf.approximated {
        println!(
            "{} Text positions were unavailable; reading order is approximated",
            style("⚠").yellow()
        );
    }

    let header = pdf.lines.header(engine.config().pdf.header_window);
    let matching = engine.detector().matching(header);
    let detected = engine.detector().detect(header);

    if matching.len() > 1 {
        let names: Vec<String> = matching.iter().map(|d| d.to_string()).collect();
        println!("{} Markers of several layouts: {}", style("ℹ").blue(), names.join(", "));
    }
    println!("{} Detected format: {}", style("✓").green(), detected);
    println!();

    let limit = args.lines.unwrap_or(usize::MAX);
    let page_starts = pdf.lines.page_starts();
    for (i, line) in pdf.lines.iter().enumerate().take(limit) {
        for page in pages_starting_at(page_starts, i) {
            println!("{}", style(format!("--- page {} ---", page)).dim());
        }
        println!("{:>4}  {}", i + 1, line);
    }

    Ok(())
}

/// 1-based numbers of every page whose first line is `line`. Pages without
/// text share their start with the next page.
fn pages_starting_at(page_starts: &[usize], line: usize) -> Vec<usize> {
    page_starts
        .iter()
        .enumerate()
        .filter(|(_, start)| **start == line)
        .map(|(page, _)| page + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_page_keeps_its_number() {
        let starts = [0, 1, 1];
        assert_eq!(pages_starting_at(&starts, 0), vec![1]);
        assert_eq!(pages_starting_at(&starts, 1), vec![2, 3]);
        assert!(pages_starting_at(&starts, 2).is_empty());
    }
}
