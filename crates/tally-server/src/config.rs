//! Configuration loading and management
//!
//! Configuration is read once at process start and immutable afterwards;
//! every component receives the values it needs at construction.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use tally_auth::MIN_SECRET_BYTES;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Symmetric session signing key; must be at least 32 bytes
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_session_duration_secs")]
    pub session_duration_secs: i64,
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: i64,
    #[serde(default = "default_max_session_secs")]
    pub max_session_secs: i64,
    /// Password hashing work factor (Argon2 time cost)
    #[serde(default = "default_hash_time_cost")]
    pub hash_time_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            session_duration_secs: default_session_duration_secs(),
            refresh_threshold_secs: default_refresh_threshold_secs(),
            max_session_secs: default_max_session_secs(),
            hash_time_cost: default_hash_time_cost(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: "pretty".to_string(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_db_path() -> String {
    "./data/tally.db".to_string()
}

fn default_session_duration_secs() -> i64 {
    900 // 15 minutes
}

fn default_refresh_threshold_secs() -> i64 {
    120 // rotate inside the last 2 minutes
}

fn default_max_session_secs() -> i64 {
    2_592_000 // 30 days, the absolute session lifetime
}

fn default_hash_time_cost() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist. The result still has to pass [`validate`].
    ///
    /// [`validate`]: Config::validate
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            warn!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Fail-closed startup checks.
    ///
    /// A short signing key is the one fatal misconfiguration: the process
    /// refuses to serve anything rather than sign tokens with it. Odd
    /// rotation thresholds are survivable and only warned about.
    pub fn validate(&self) -> Result<()> {
        if self.auth.secret.len() < MIN_SECRET_BYTES {
            anyhow::bail!(
                "auth.secret must be at least {} bytes (got {}); refusing to start",
                MIN_SECRET_BYTES,
                self.auth.secret.len()
            );
        }

        if self.auth.refresh_threshold_secs >= self.auth.session_duration_secs {
            warn!(
                "refresh threshold ({}s) is not below the session duration ({}s); every request will rotate",
                self.auth.refresh_threshold_secs, self.auth.session_duration_secs
            );
        }
        if self.auth.session_duration_secs > self.auth.max_session_secs {
            warn!(
                "session duration ({}s) exceeds the absolute lifetime ({}s); the absolute cap wins",
                self.auth.session_duration_secs, self.auth.max_session_secs
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_refuse_to_validate_without_secret() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_secret_passes() {
        let mut config = Config::default();
        config.auth.secret = "0123456789abcdef0123456789abcdef".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_short_secret_fails_closed() {
        let mut config = Config::default();
        config.auth.secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 5555

[auth]
secret = "0123456789abcdef0123456789abcdef"
session_duration_secs = 600
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 5555);
        assert_eq!(config.auth.session_duration_secs, 600);
        // Unspecified values keep their defaults
        assert_eq!(config.auth.refresh_threshold_secs, 120);
        assert_eq!(config.auth.max_session_secs, 2_592_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load("/nonexistent/tally.toml").unwrap();
        assert_eq!(config.server.port, 4000);
        assert!(config.auth.secret.is_empty());
    }
}
