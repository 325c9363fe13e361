//! Node configuration types.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Configuration for the Pantry node.
///
/// Every field has a default, so a partial YAML file (or none at all)
/// is fine. Command-line flags override file values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// API listen address.
    pub bind_addr: SocketAddr,
    /// Log level.
    pub log_level: String,
    /// Log format (pretty, json).
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// Errors reading or parsing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, "pretty");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("log_level: debug\n").unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_full_yaml() {
        let config: Config = serde_yaml::from_str(
            "bind_addr: 0.0.0.0:9999\nlog_level: warn\nlog_format: json\n",
        )
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9999);
        assert_eq!(config.log_format, "json");
    }
}
