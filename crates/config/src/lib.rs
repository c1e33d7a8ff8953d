// Configuration Management
//
// This crate handles all configuration loading for the legal assistant API.
// It provides:
// - Configuration structs and deserialization
// - Environment and file loading logic
// - Default configuration values
//
// Configuration is built once at process start and passed down explicitly,
// so services never read the process environment themselves.

use std::path::Path;
use thiserror::Error;

pub mod types;

// Re-export all configuration types
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found. Tried paths: {paths}")]
    FileNotFound { paths: String },

    #[error("Failed to read configuration file: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration loading interface
impl ApiConfig {
    /// Load configuration from YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ApiConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        let config_paths = ["config/config.yaml", "config.yaml"];

        for path in &config_paths {
            if std::path::Path::new(path).exists() {
                return Self::load_from_file(path);
            }
        }

        Err(ConfigError::FileNotFound {
            paths: config_paths.join(", "),
        })
    }

    /// Load from a config file when one exists, otherwise from the environment
    pub fn load_or_env() -> Result<Self, ConfigError> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(ConfigError::FileNotFound { .. }) => {
                let config = Self::from_env().map_err(ConfigError::Invalid)?;
                config.validate()?;
                Ok(config)
            }
            Err(e) => Err(e),
        }
    }

    /// Reject values that would make the service misbehave at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assistant.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid(
                "assistant.max_tool_rounds must be at least 1".to_string(),
            ));
        }
        if self.search.max_results == 0 || self.search.max_results > 100 {
            return Err(ConfigError::Invalid(
                "search.max_results must be between 1 and 100".to_string(),
            ));
        }
        if self.search.trusted_domains.is_empty() {
            return Err(ConfigError::Invalid(
                "search.trusted_domains must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
