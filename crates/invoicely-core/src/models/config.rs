//! Configuration structures for the ingestion pipeline.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main configuration for invoicely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoicelyConfig {
    /// Extraction oracle configuration.
    pub oracle: OracleConfig,

    /// Rate-limit retry configuration.
    pub retry: RetryConfig,

    /// Batch ingestion configuration.
    pub batch: BatchConfig,

    /// Record store configuration.
    pub store: StoreConfig,
}

/// Oracle (Gemini) client configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// API base URL, without the version path.
    pub base_url: String,

    /// Model used for extraction and key checks.
    pub model: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Sampling temperature, kept low for stable extraction.
    pub temperature: f32,

    /// API key. `GEMINI_API_KEY` takes precedence when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 120,
            temperature: 0.1,
            api_key: None,
        }
    }
}

impl fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the API key: explicit value, then environment, then config file.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .or_else(|| self.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Backoff policy for rate-limited extraction attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (3 means 4 attempts total).
    pub max_retries: u32,

    /// Wait before the first retry; doubles on every further retry.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 5000,
        }
    }
}

/// Batch ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause between consecutive documents, keeps us under the oracle's request rate.
    pub cooldown_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { cooldown_ms: 6000 }
    }
}

/// Record store location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding every stored invoice. Unset means the
    /// application's data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl InvoicelyConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
