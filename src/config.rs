//! Configuration module for Coffer.

use serde::Deserialize;
use std::path::Path;

use crate::{CofferError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/coffer.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the blob storage directory.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Reject uploads that would push a user past their quota.
    ///
    /// Off by default: quotas are informational and uploads are accepted
    /// regardless of usage. Turning this on changes upload behavior for
    /// users at their limit.
    #[serde(default)]
    pub enforce_quota: bool,
}

fn default_storage_path() -> String {
    "data/blobs".to_string()
}

fn default_max_upload_size() -> u64 {
    50
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
            enforce_quota: false,
        }
    }
}

/// Content-safety scanner configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Filename extensions that are always rejected.
    #[serde(default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,
    /// Substrings in a filename that mark it as malicious.
    #[serde(default = "default_blocked_keywords")]
    pub blocked_keywords: Vec<String>,
}

fn default_blocked_extensions() -> Vec<String> {
    ["exe", "bat", "cmd", "sh", "msi", "scr"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_blocked_keywords() -> Vec<String> {
    vec!["virus".to_string()]
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            blocked_extensions: default_blocked_extensions(),
            blocked_keywords: default_blocked_keywords(),
        }
    }
}

/// Account configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Storage quota in megabytes assigned to new accounts.
    #[serde(default = "default_quota_mb")]
    pub default_quota_mb: i64,
    /// Grant the first registered account admin rights.
    #[serde(default = "default_first_user_admin")]
    pub first_user_admin: bool,
}

fn default_quota_mb() -> i64 {
    5120
}

fn default_first_user_admin() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_quota_mb: default_quota_mb(),
            first_user_admin: default_first_user_admin(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/coffer.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Content-safety scanner configuration.
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// Account configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(CofferError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CofferError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `COFFER_DATABASE_PATH`: Override the database file path
    /// - `COFFER_STORAGE_PATH`: Override the blob storage directory
    /// - `COFFER_LOG_LEVEL`: Override the log level
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("COFFER_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(path) = std::env::var("COFFER_STORAGE_PATH") {
            if !path.is_empty() {
                self.storage.path = path;
            }
        }
        if let Ok(level) = std::env::var("COFFER_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The maximum upload size is zero
    /// - The default account quota is negative
    pub fn validate(&self) -> Result<()> {
        if self.storage.max_upload_size_mb == 0 {
            return Err(CofferError::Validation(
                "storage.max_upload_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.auth.default_quota_mb < 0 {
            return Err(CofferError::Validation(
                "auth.default_quota_mb must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
