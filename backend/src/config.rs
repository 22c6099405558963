//! Process-wide configuration.
//!
//! Built once in `main` from `INSIGHTS_*` environment variables and shared
//! read-only with every handler through `web::Data<AppConfig>`.

use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PATH: &str = "Tiktok_youtube.db";
const DEFAULT_DATASET_CSV: &str = "youtube_shorts_tiktok_trends_2025.csv";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_JSON_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// SQLite file holding the dataset, report queries and templates.
    pub db_path: PathBuf,
    /// CSV used by the reseed job when the request names none.
    pub dataset_csv: PathBuf,
    pub static_dir: PathBuf,
    /// When false, HTML for text/markdown templates always uses the regex fallback.
    pub markdown_enabled: bool,
    /// Insert the built-in queries and templates for slugs that are not stored yet.
    pub seed_defaults: bool,
    pub json_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            dataset_csv: PathBuf::from(DEFAULT_DATASET_CSV),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            markdown_enabled: true,
            seed_defaults: true,
            json_limit: DEFAULT_JSON_LIMIT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(host) = lookup("INSIGHTS_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("INSIGHTS_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "INSIGHTS_PORT",
                expected: "a port number",
                value: port.clone(),
            })?;
        }
        if let Some(path) = lookup("INSIGHTS_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("INSIGHTS_DATASET_CSV") {
            config.dataset_csv = PathBuf::from(path);
        }
        if let Some(path) = lookup("INSIGHTS_STATIC_DIR") {
            config.static_dir = PathBuf::from(path);
        }
        if let Some(value) = lookup("INSIGHTS_MARKDOWN") {
            config.markdown_enabled = parse_switch("INSIGHTS_MARKDOWN", &value)?;
        }
        if let Some(value) = lookup("INSIGHTS_SEED_DEFAULTS") {
            config.seed_defaults = parse_switch("INSIGHTS_SEED_DEFAULTS", &value)?;
        }
        if let Some(limit) = lookup("INSIGHTS_JSON_LIMIT") {
            config.json_limit = limit.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "INSIGHTS_JSON_LIMIT",
                expected: "a size in bytes",
                value: limit.clone(),
            })?;
        }

        Ok(config)
    }
}

fn parse_switch(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            expected: "on/off",
            value: value.to_string(),
        }),
    }
}
