//! Configuration sources
//!
//! This module defines traits and implementations for loading configuration
//! from different sources.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::cli::Args;
use crate::config::error::{ConfigError, Result};
use crate::config::types::{parse_socket_addr, ConfigValues, RelayConfig, ValueSource};

/// Configuration source trait
pub trait ConfigSource {
    /// Load configuration from this source
    fn load(&self) -> Result<RelayConfig>;

    /// Get the source type
    fn source_type(&self) -> ValueSource;
}

/// Default configuration source
pub struct DefaultSource;

impl ConfigSource for DefaultSource {
    fn load(&self) -> Result<RelayConfig> {
        debug!("Loading default configuration");
        Ok(RelayConfig::default())
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::Default
    }
}

/// JSON file configuration source
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    /// Create a new file source
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<RelayConfig> {
        debug!("Loading configuration from file: {}", self.path.display());

        if !self.path.exists() {
            warn!("Configuration file not found: {}", self.path.display());
            warn!("Using default values unless overridden by environment or command line");
            return Ok(RelayConfig::empty());
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::FileReadError(self.path.clone(), e.to_string()))?;

        let values: ConfigValues = serde_json::from_str(&contents).map_err(|e| {
            ConfigError::ParseError(format!("Error parsing {}: {}", self.path.display(), e))
        })?;

        let mut config = RelayConfig::from_values(values);
        config.config_file = Some(self.path.clone());
        config.mark_sources(self.source_type());

        Ok(config)
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::File
    }
}

/// Environment variable configuration source
///
/// Invalid values are logged and skipped.
pub struct EnvSource {
    pub prefix: String,
}

impl EnvSource {
    /// Create a new environment source
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn var(&self, name: &str) -> Option<String> {
        let full_name = format!("{}{}", self.prefix, name);
        match env::var(&full_name) {
            Ok(value) => {
                debug!("Found environment variable {}={}", full_name, value);
                Some(value)
            }
            Err(_) => None,
        }
    }
}

impl ConfigSource for EnvSource {
    fn load(&self) -> Result<RelayConfig> {
        debug!("Loading configuration from environment variables with prefix: {}", self.prefix);

        let mut values = ConfigValues::default();

        if let Some(value) = self.var("LISTEN") {
            match parse_socket_addr(&value) {
                Ok(addr) => values.listen = Some(addr),
                Err(_) => warn!("Invalid listen in environment: {}", value),
            }
        }

        if let Some(value) = self.var("UPSTREAM") {
            match parse_socket_addr(&value) {
                Ok(addr) => values.upstream = Some(addr),
                Err(_) => warn!("Invalid upstream in environment: {}", value),
            }
        }

        if let Some(value) = self.var("LOG_LEVEL") {
            values.log_level = Some(value);
        }

        if let Some(value) = self.var("BUFFER_SIZE") {
            match value.parse::<usize>() {
                Ok(size) => values.buffer_size = Some(size),
                Err(_) => warn!("Invalid buffer_size in environment: {}", value),
            }
        }

        let mut config = RelayConfig::from_values(values);
        config.config_file = self.var("CONFIG_FILE").map(PathBuf::from);
        config.mark_sources(self.source_type());

        Ok(config)
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::Environment
    }
}

/// Command line argument configuration source
pub struct CliSource {
    pub args: Args,
}

impl CliSource {
    /// Create a new command line source
    pub fn new(args: Args) -> Self {
        Self { args }
    }
}

impl ConfigSource for CliSource {
    fn load(&self) -> Result<RelayConfig> {
        debug!("Loading configuration from command line arguments");

        let mut config = RelayConfig::from_values(self.args.values());
        config.config_file = self.args.config_file.clone();
        config.mark_sources(self.source_type());

        Ok(config)
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::CommandLine
    }
}
