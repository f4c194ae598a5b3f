//! Configuration file loading for Enclave
//!
//! Handles loading and parsing configuration files using the config crate.

use std::path::Path;

use config::{Config as ConfigBuilder, File, FileFormat};

use crate::config::{Config, ConfigError};

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.reclaim.attempts == 0 {
            return Err(ConfigError::Invalid(
                "reclaim.attempts must be at least 1".to_string(),
            ));
        }

        if self.unit_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "unit_extensions must not be empty".to_string(),
            ));
        }

        for ext in &self.unit_extensions {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                return Err(ConfigError::Invalid(format!(
                    "invalid unit extension '{ext}'"
                )));
            }
        }

        Ok(())
    }
}
