//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::ApiConfig;
use crate::chat::HubConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ApiConfig,

    #[serde(default)]
    pub hub: HubConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

fn default_log_level() -> String {
    "murmur=info,tower_http=info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("murmur").join("config.toml")),
            Some(PathBuf::from("/etc/murmur/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                return Self::load_with_env(path);
            }
        }

        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(host) = lookup("MURMUR_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("MURMUR_PORT") {
            self.server.port = parse_value("MURMUR_PORT", &port)?;
        }

        // Hub overrides
        if let Some(max) = lookup("MURMUR_MAX_CONNECTIONS") {
            self.hub.max_connections = parse_value("MURMUR_MAX_CONNECTIONS", &max)?;
        }
        if let Some(len) = lookup("MURMUR_PREVIEW_LENGTH") {
            self.hub.preview_length = parse_value("MURMUR_PREVIEW_LENGTH", &len)?;
        }

        // Logging overrides
        if let Some(level) = lookup("MURMUR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("MURMUR_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }

        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Murmur Configuration
#
# Environment variables override these settings:
# - MURMUR_HOST
# - MURMUR_PORT
# - MURMUR_MAX_CONNECTIONS
# - MURMUR_PREVIEW_LENGTH
# - MURMUR_LOG_LEVEL
# - MURMUR_LOG_FORMAT

[server]
host = "0.0.0.0"
port = 3000

# Allowed CORS origins (empty allows any origin)
cors_origins = []

[hub]
# Maximum number of concurrent connections
max_connections = 1000

# Characters of message text shown in notifications
preview_length = 50

# Sent to each new connection; set to "" to disable
welcome_message = "Welcome to Anonymous Chat!"

# Handshake greeting
greeting = "Hello! You are connected to the server."

[logging]
# Filter directive, overridden by RUST_LOG
level = "murmur=info,tower_http=info"

# Output format: pretty, json
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.hub.max_connections, 1000);
        assert_eq!(config.hub.preview_length, 50);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        let defaults = Config::default();

        assert_eq!(config.server.host, defaults.server.host);
        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.hub.welcome_message, defaults.hub.welcome_message);
        assert_eq!(config.hub.greeting, defaults.hub.greeting);
        assert_eq!(config.logging.level, defaults.logging.level);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [hub]
            preview_length = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.hub.preview_length, 20);
        assert_eq!(config.hub.max_connections, 1000);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4100\n\n[logging]\nformat = \"json\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        match Config::load(file.path()) {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MURMUR_HOST", "127.0.0.1"),
            ("MURMUR_PORT", "8099"),
            ("MURMUR_MAX_CONNECTIONS", "5"),
            ("MURMUR_PREVIEW_LENGTH", "12"),
            ("MURMUR_LOG_FORMAT", "JSON"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.addr(), "127.0.0.1:8099");
        assert_eq!(config.hub.max_connections, 5);
        assert_eq!(config.hub.preview_length, 12);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == "MURMUR_PORT").then(|| "lots".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
