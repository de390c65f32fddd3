//! Template command - write the CSV fill-in template.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

/// Arguments for the template command.
#[derive(Args)]
pub struct TemplateArgs {
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: TemplateArgs) -> anyhow::Result<()> {
    let template = riskscan_core::csv_template();

    match &args.output {
        Some(path) => {
            fs::write(path, template)?;
            println!("{} Template written to {}", style("✓").green(), path.display());
        }
        None => print!("{}", template),
    }

    Ok(())
}
