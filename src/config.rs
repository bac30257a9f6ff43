//! Environment-driven configuration.
//!
//! All settings come from the process environment; a `.env` file in the
//! working directory is honored when present. Credentials are passed through
//! to the batch service and the object store, never managed here.

use crate::error::{Result, SheafError};

/// Batch-completion service settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API key, sent as a bearer token
    pub api_key: String,
    /// Optional organization header value
    pub organization_id: Option<String>,
    /// Model identifier used for every batch entry
    pub completions_model: String,
}

/// Object store settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
}

/// Logical folder names inside the bucket.
#[derive(Debug, Clone)]
pub struct FolderConfig {
    /// Folder holding raw document text
    pub raw_data: String,
    /// Folder receiving batch output artifacts
    pub batch_output: String,
}

/// Polling cadence for `await_completion`.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval_secs: u64,
    /// `None` keeps the unbounded wait
    pub max_attempts: Option<usize>,
}

/// Root configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub folders: FolderConfig,
    pub poll: PollConfig,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api: ApiConfig {
                api_key: require("OPENAI_API_KEY")?,
                organization_id: optional("ORGANIZATION_ID"),
                completions_model: require("COMPLETIONS_MODEL")?,
            },
            storage: StorageConfig {
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
                region: require("AWS_REGION")?,
                bucket: require("AWS_BUCKET")?,
            },
            folders: FolderConfig {
                raw_data: optional("RAW_DATA_FOLDER").unwrap_or_else(|| "raw_data".to_string()),
                batch_output: optional("BATCH_OUTPUT_FOLDER")
                    .unwrap_or_else(|| "batch_outputs".to_string()),
            },
            poll: PollConfig {
                interval_secs: parse_optional("POLL_INTERVAL_SECS")?.unwrap_or(30),
                max_attempts: parse_optional("MAX_POLL_ATTEMPTS")?,
            },
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| SheafError::Config(format!("missing environment variable {name}")))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_optional<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match optional(name) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| SheafError::Config(format!("{name} is not a valid number: {value}"))),
        None => Ok(None),
    }
}
