//! Process command - extract fields from a single statement file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use riskscan_core::models::{CanonicalFields, FieldName, FieldValue};
use riskscan_core::{ExtractionOutcome, StatementEngine};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or CSV)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output (canonical template columns)
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for written outputs.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("Reading statement...");

    let bytes = fs::read(&args.input)?;
    let filename = display_name(&args.input);
    let engine = StatementEngine::new(config);

    pb.set_message("Extracting fields...");
    let outcome = engine.extract_file(&filename, &bytes)?;
    pb.finish_and_clear();

    let output = format_outcome(&outcome, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if outcome.requires_manual_entry {
        eprintln!(
            "{} Nothing could be read from {}; enter the values manually.",
            style("⚠").yellow(),
            filename
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// The file name used for type detection and reports.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

pub fn format_outcome(outcome: &ExtractionOutcome, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
        OutputFormat::Csv => format_csv(&outcome.fields),
        OutputFormat::Text => Ok(format_text(outcome)),
    }
}

/// A CSV cell: empty when not found, so the file re-imports with the same
/// tri-state readings.
pub fn count_cell(value: &FieldValue<u64>) -> String {
    match value {
        FieldValue::NotFound => String::new(),
        FieldValue::Zero => "0".to_string(),
        FieldValue::Value(v) => v.to_string(),
    }
}

pub fn amount_cell(value: &FieldValue<rust_decimal::Decimal>) -> String {
    match value {
        FieldValue::NotFound => String::new(),
        FieldValue::Zero => "0.00".to_string(),
        FieldValue::Value(v) => format!("{:.2}", v),
    }
}

/// Field cells in canonical column order.
pub fn field_cells(fields: &CanonicalFields) -> Vec<String> {
    vec![
        count_cell(&fields.total_sales_count),
        amount_cell(&fields.total_sales_volume),
        count_cell(&fields.cnp_txn_count),
        count_cell(&fields.mastercard_txn_count),
        count_cell(&fields.visa_txn_count),
        count_cell(&fields.tc15_count),
        count_cell(&fields.tc40_count),
        amount_cell(&fields.fraud_amount_usd),
        fields
            .statement_period
            .as_ref()
            .map(|p| format!("{:04}-{:02}", p.year, p.month))
            .unwrap_or_default(),
    ]
}

fn format_csv(fields: &CanonicalFields) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(FieldName::ALL.iter().map(|f| f.csv_header()))?;
    wtr.write_record(field_cells(fields))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_text(outcome: &ExtractionOutcome) -> String {
    let f = &outcome.fields;
    let mut output = String::new();

    output.push_str(&format!("Format: {}\n", outcome.detected_format));
    match &f.statement_period {
        Some(period) => output.push_str(&format!("Period: {}\n", period)),
        None => output.push_str("Period: not found\n"),
    }
    output.push('\n');

    output.push_str("Sales:\n");
    output.push_str(&format!("  Count:                {}\n", f.total_sales_count));
    output.push_str(&format!("  Volume:               {}\n", f.total_sales_volume));
    output.push_str(&format!("  Card not present:     {}\n", f.cnp_txn_count));
    output.push_str(&format!("  Visa:                 {}\n", f.visa_txn_count));
    output.push_str(&format!("  Mastercard:           {}\n", f.mastercard_txn_count));
    output.push('\n');

    output.push_str("Risk:\n");
    output.push_str(&format!("  Chargebacks (TC15):   {}\n", f.tc15_count));
    output.push_str(&format!("  Fraud reports (TC40): {}\n", f.tc40_count));
    output.push_str(&format!("  Fraud amount (USD):   {}\n", f.fraud_amount_usd));

    if outcome.requires_manual_entry {
        output.push_str("\nManual entry required\n");
    }

    if !outcome.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &outcome.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
