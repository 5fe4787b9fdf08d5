//! Ingest command - extract, validate and store a batch of invoices.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use invoicely_core::models::document::DocumentSource;
use invoicely_core::oracle::{Credential, GeminiClient};
use invoicely_core::pipeline::{
    BatchResult, CancellationFlag, DocumentOutcome, DocumentPhase, IngestionPipeline, ProgressEvent,
};

use super::{load_config, open_store};

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Gemini API key (overrides GEMINI_API_KEY and the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Pause between documents in milliseconds
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Retries per document after a rate limit
    #[arg(long)]
    max_retries: Option<u32>,
}

pub async fn run(args: IngestArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(cooldown_ms) = args.cooldown_ms {
        config.batch.cooldown_ms = cooldown_ms;
    }
    if let Some(max_retries) = args.max_retries {
        config.retry.max_retries = max_retries;
    }

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let documents: Vec<DocumentSource> = files.into_iter().map(DocumentSource::from_path).collect();
    let credential = Credential::from_option(config.oracle.resolve_api_key(args.api_key.as_deref()));

    println!(
        "{} Found {} files to ingest",
        style("ℹ").blue(),
        documents.len()
    );
    if credential.is_missing() {
        println!(
            "{} No API key configured. Pass --api-key or set GEMINI_API_KEY.",
            style("!").yellow()
        );
    }

    let oracle = GeminiClient::new(config.oracle.clone())?;
    let store = open_store(&config);

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let cancel = CancellationFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current document");
            signal_flag.cancel();
        }
    });

    let observer_pb = pb.clone();
    let mut pipeline = IngestionPipeline::from_config(oracle, store, &config)
        .with_cancellation(cancel)
        .with_observer(move |event: &ProgressEvent| report(&observer_pb, event));

    let result = pipeline.ingest(documents, &credential).await;
    pb.finish_and_clear();

    print_summary(&result, start.elapsed());
    Ok(())
}

fn report(pb: &ProgressBar, event: &ProgressEvent) {
    match event {
        ProgressEvent::PhaseChanged { filename, phase, .. } => {
            pb.set_message(format!("{}: {}", filename, phase));
        }
        ProgressEvent::RetryScheduled { filename, notice, .. } => {
            pb.println(format!(
                "{} {} rate limited, retry {}/{} in {}s",
                style("⏳").yellow(),
                filename,
                notice.attempt + 1,
                notice.max_retries,
                notice.wait.as_secs()
            ));
        }
        ProgressEvent::CooldownStarted { wait, .. } => {
            pb.set_message(format!("cooling down {}s", wait.as_secs()));
        }
        ProgressEvent::DocumentFinished {
            filename,
            phase,
            error,
            ..
        } => {
            pb.inc(1);
            if *phase != DocumentPhase::Stored {
                pb.println(format!(
                    "{} {}: {}",
                    style("✗").red(),
                    filename,
                    error.as_deref().unwrap_or("unknown error")
                ));
            }
        }
        ProgressEvent::BatchStarted { .. } | ProgressEvent::BatchFinished { .. } => {}
    }
}

fn print_summary(result: &BatchResult, elapsed: Duration) {
    let summary = result.summary();
    debug!(?summary, "Batch summary");

    println!();
    println!(
        "{} {}/{} invoices ingested in {:.1}s",
        style("✓").green(),
        summary.succeeded,
        summary.total,
        elapsed.as_secs_f64()
    );

    let review: Vec<_> = result.records().filter(|r| r.needs_review()).collect();
    if !review.is_empty() {
        println!();
        println!("{}", style("Needs review:").yellow());
        for record in review {
            println!(
                "  - {} ({}): {}",
                record.id,
                record.filename,
                record.validation_message.as_deref().unwrap_or("")
            );
        }
    }

    let failures: Vec<&DocumentOutcome> = result.failures().collect();
    if !failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in failures {
            println!(
                "  - {}: {}",
                outcome.filename(),
                outcome.error_message().unwrap_or_default()
            );
        }
    }
}
