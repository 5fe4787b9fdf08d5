//! CLI application for invoice ingestion and review.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, export, ingest, key, records, stats};

/// Invoicely - Turn invoice scans into validated, reviewable records
#[derive(Parser)]
#[command(name = "invoicely")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and store invoices from image or PDF files
    Ingest(ingest::IngestArgs),

    /// List stored invoices, newest first
    List(records::ListArgs),

    /// Show one stored invoice as JSON
    Show(records::ShowArgs),

    /// Correct fields of a stored invoice and re-validate it
    Edit(records::EditArgs),

    /// Delete a stored invoice
    Delete(records::DeleteArgs),

    /// Export all stored invoices to CSV
    Export(export::ExportArgs),

    /// Show spend, tax and vendor statistics
    Stats(stats::StatsArgs),

    /// Manage the Gemini API key
    Key(key::KeyArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ingest(args) => ingest::run(args, config_path).await,
        Commands::List(args) => records::list(args, config_path),
        Commands::Show(args) => records::show(args, config_path),
        Commands::Edit(args) => records::edit(args, config_path),
        Commands::Delete(args) => records::delete(args, config_path),
        Commands::Export(args) => export::run(args, config_path),
        Commands::Stats(args) => stats::run(args, config_path),
        Commands::Key(args) => key::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path),
    }
}
