//! Subcommand implementations and the helpers they share.

pub mod config;
pub mod export;
pub mod ingest;
pub mod key;
pub mod records;
pub mod stats;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use invoicely_core::models::config::InvoicelyConfig;
use invoicely_core::store::JsonFileStore;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invoicely")
        .join("config.json")
}

/// Path of the config file in effect: `-c` if given, otherwise the default.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load configuration from `-c`, falling back to the default file, then to
/// built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvoicelyConfig> {
    if let Some(path) = config_path {
        return InvoicelyConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path));
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config file {}", path.display());
        InvoicelyConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    } else {
        Ok(InvoicelyConfig::default())
    }
}

/// Record store file: configured path or the platform data directory.
pub fn store_path(config: &InvoicelyConfig) -> PathBuf {
    config.store.path.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("invoicely")
            .join("invoices.json")
    })
}

pub fn open_store(config: &InvoicelyConfig) -> JsonFileStore {
    let path = store_path(config);
    debug!("Using record store {}", path.display());
    JsonFileStore::new(path)
}
