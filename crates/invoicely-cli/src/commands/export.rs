//! Export command - write every stored invoice to a CSV file.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use clap::Args;
use console::style;

use invoicely_core::invoice::{export_filename, records_to_csv};
use invoicely_core::store::RecordStore;

use super::{load_config, open_store};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Output file (defaults to invoices_export_<date>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: ExportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config);

    let records = store.list()?;
    let csv = records_to_csv(&records)?;

    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(export_filename(Local::now().date_naive())));

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, csv)?;

    println!(
        "{} Exported {} invoices to {}",
        style("✓").green(),
        records.len(),
        output_path.display()
    );

    Ok(())
}
