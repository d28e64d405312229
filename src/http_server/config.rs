//! Server Configuration
//!
//! JSON configuration file for the REST shim: bind address, CORS, the
//! tables to register, optional seed data, filter strictness and logging.

use std::fs;
use std::path::{Path, PathBuf};

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::LogFormat;
use crate::rest_api::ParseMode;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 54321)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty means any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Tables exposed under /rest/v1
    #[serde(default = "default_tables")]
    pub tables: Vec<String>,

    /// JSON file of `{ "<table>": [records...] }` loaded at start
    #[serde(default)]
    pub seed_path: Option<PathBuf>,

    /// Reject malformed filter clauses with 400 instead of dropping them
    #[serde(default)]
    pub filter_mode: ParseMode,

    #[serde(default)]
    pub log: LogConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    54321
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(), // Vite dev server
        "http://localhost:8080".to_string(),
    ]
}

fn default_tables() -> Vec<String> {
    [
        "patients",
        "appointments",
        "dentists",
        "procedures",
        "treatment_plans",
        "inventory_items",
        "sales",
        "payments",
        "invoices",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

fn default_log_level() -> String {
    "orthoplus_rest=info,tower_http=info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            tables: default_tables(),
            seed_path: None,
            filter_mode: ParseMode::default(),
            log: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ServerConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be > 0".to_string()));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }

        if let Some(bad) = self
            .tables
            .iter()
            .find(|t| t.is_empty() || !t.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        {
            return Err(ConfigError::Invalid(format!("invalid table name: '{}'", bad)));
        }

        if let Some(bad) = self.cors_origins.iter().find(|o| !is_valid_origin(o)) {
            return Err(ConfigError::Invalid(format!("invalid CORS origin: '{}'", bad)));
        }

        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `scheme://host[:port]` with an http(s) scheme, usable as a header value
fn is_valid_origin(origin: &str) -> bool {
    let rest = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"));

    match rest {
        Some(authority) => {
            !authority.is_empty()
                && !authority.contains(['/', '?', '#'])
                && !authority.chars().any(char::is_whitespace)
                && HeaderValue::from_str(origin).is_ok()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 54321);
        assert!(config.tables.contains(&"patients".to_string()));
        assert_eq!(config.filter_mode, ParseMode::Permissive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::with_port(8080);
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 9000, "filter_mode": "strict", "log": {{"format": "json"}}}}"#).unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.filter_mode, ParseMode::Strict);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.level, default_log_level());
    }

    #[test]
    fn test_validation_errors() {
        let config = ServerConfig::with_port(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ServerConfig {
            tables: vec!["patients; drop".to_string()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_cors_origin_validation() {
        for bad in ["localhost:5173", "http://", "http://app.example.com/", "ftp://files", "http://a b"] {
            let config = ServerConfig {
                cors_origins: vec!["https://app.example.com".to_string(), bad.to_string()],
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(ref msg)) if msg.contains("CORS")),
                "{} should be rejected",
                bad
            );
        }

        let config = ServerConfig {
            cors_origins: vec!["https://app.example.com".to_string(), "http://localhost:5173".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"log": {{"format": "xml"}}}}"#).unwrap();
        assert!(matches!(
            ServerConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ServerConfig::load(Path::new("/nonexistent/orthoplus.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
