//! Batch processing command for multiple statement files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use riskscan_core::models::FieldName;
use riskscan_core::statement::ProgressHook;
use riskscan_core::{BatchAggregator, BatchEntry, ExtractionOutcome, StatementEngine, StatementFile};

use super::load_config;
use super::process::{display_name, field_cells, format_outcome, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers (default: from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    if let Some(jobs) = args.jobs {
        config.batch.jobs = jobs;
    }

    let paths: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "csv")
        })
        .collect();

    if paths.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        paths.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    // Unreadable files become failure entries like undecodable ones.
    let mut files = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();
    for path in &paths {
        let name = display_name(path);
        match fs::read(path) {
            Ok(bytes) => files.push(StatementFile::new(name, bytes)),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                unreadable.push(BatchEntry::failure(name, e.to_string(), None));
            }
        }
    }

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files",
        )?
        .progress_chars("=>-"),
    );
    pb.inc(unreadable.len() as u64);

    let hook_pb = pb.clone();
    let hook: ProgressHook = Arc::new(move |_: &BatchEntry| hook_pb.inc(1));

    let aggregator = BatchAggregator::with_engine(StatementEngine::new(config));
    let mut entries = aggregator.run_parallel(files, Some(hook)).await;
    entries.extend(unreadable);
    riskscan_core::statement::sort_chronologically(&mut entries);

    pb.finish_and_clear();

    if let Some(output_dir) = &args.output_dir {
        for entry in entries.iter().filter(|e| e.is_success()) {
            let Some(outcome) = outcome_of(entry) else {
                continue;
            };
            let stem = Path::new(entry.filename())
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("statement");
            let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));

            fs::write(&output_path, format_outcome(&outcome, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &entries)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&BatchEntry> = entries.iter().filter(|e| !e.is_success()).collect();
    let manual = entries.iter().filter(|e| e.requires_manual_entry()).count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        entries.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} need manual entry",
        style(entries.len() - failed.len()).green(),
        style(failed.len()).red(),
        style(manual).yellow()
    );

    println!();
    for entry in &entries {
        let period = entry
            .period()
            .map(|p| p.label.clone())
            .unwrap_or_else(|| "no period".to_string());
        let status = if entry.is_success() {
            style("ok").green()
        } else {
            style("failed").red()
        };
        println!("  {:<10} {:<8} {}", period, status, entry.filename());
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for entry in &failed {
            println!(
                "  - {}: {}",
                entry.filename(),
                entry.parse_error().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Rebuild the single-file view of a successful entry.
fn outcome_of(entry: &BatchEntry) -> Option<ExtractionOutcome> {
    Some(ExtractionOutcome {
        fields: entry.fields()?.clone(),
        warnings: entry.warnings().to_vec(),
        detected_format: entry.detected_format()?,
        requires_manual_entry: entry.requires_manual_entry(),
    })
}

fn write_summary(path: &Path, entries: &[BatchEntry]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status", "detected_format", "requires_manual_entry"];
    header.extend(FieldName::ALL.iter().map(|f| f.csv_header()));
    header.extend(["warnings", "error"]);
    wtr.write_record(&header)?;

    for entry in entries {
        let mut record = vec![entry.filename().to_string()];
        match entry.fields() {
            Some(fields) => {
                record.push("success".to_string());
                record.push(
                    entry
                        .detected_format()
                        .map(|f| f.to_string())
                        .unwrap_or_default(),
                );
                record.push(entry.requires_manual_entry().to_string());
                let mut cells = field_cells(fields);
                if fields.statement_period.is_none() {
                    if let Some(period) = entry.period() {
                        cells[FieldName::ALL.len() - 1] = format!("{:04}-{:02}", period.year, period.month);
                    }
                }
                record.extend(cells);
                record.push(entry.warnings().join("; "));
                record.push(String::new());
            }
            None => {
                record.push("error".to_string());
                record.push(String::new());
                record.push(String::new());
                record.extend(std::iter::repeat_n(String::new(), FieldName::ALL.len()));
                record.push(String::new());
                record.push(entry.parse_error().unwrap_or_default().to_string());
            }
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
