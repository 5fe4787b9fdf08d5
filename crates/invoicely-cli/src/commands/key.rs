//! Key command - verify a Gemini API key before running a batch.

use clap::{Args, Subcommand};
use console::style;

use invoicely_core::oracle::{Credential, GeminiClient, InvoiceOracle};

use super::load_config;

/// Arguments for the key command.
#[derive(Args)]
pub struct KeyArgs {
    #[command(subcommand)]
    command: KeyCommand,
}

#[derive(Subcommand)]
enum KeyCommand {
    /// Check that the key is accepted by the API
    Check {
        /// Key to check (defaults to GEMINI_API_KEY or the config file)
        key: Option<String>,
    },
}

pub async fn run(args: KeyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        KeyCommand::Check { key } => check(key, config_path).await,
    }
}

async fn check(key: Option<String>, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let credential = Credential::from_option(config.oracle.resolve_api_key(key.as_deref()));

    if credential.is_missing() {
        anyhow::bail!("No API key given. Pass one or set GEMINI_API_KEY.");
    }

    let client = GeminiClient::new(config.oracle.clone())?;
    let result = client.check_credential(&credential).await;

    match result.reason() {
        None => {
            println!("{} API key is valid", style("✓").green());
            Ok(())
        }
        Some(reason) => anyhow::bail!(reason),
    }
}
