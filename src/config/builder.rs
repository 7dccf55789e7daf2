//! Configuration builder
//!
//! This module provides a builder pattern for constructing configuration.

use std::path::{Path, PathBuf};

use log::{debug, LevelFilter};

use crate::config::cli::Args;
use crate::config::defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX, LOG_LEVEL_STR};
use crate::config::error::Result;
use crate::config::source::{CliSource, ConfigSource, DefaultSource, EnvSource, FileSource};
use crate::config::types::RelayConfig;
use crate::config::validator::{log_level_filter, validate_config};

/// Configuration builder
///
/// Sources are applied in the order they were added, later ones winning.
pub struct ConfigBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
    validate: bool,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            validate: true,
        }
    }

    /// Add default source
    pub fn with_defaults(mut self) -> Self {
        debug!("Adding default configuration source");
        self.sources.push(Box::new(DefaultSource));
        self
    }

    /// Add file source
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        debug!("Adding file configuration source: {}", path.display());
        self.sources.push(Box::new(FileSource::new(path)));
        self
    }

    /// Add environment source
    pub fn with_env(mut self, prefix: &str) -> Self {
        debug!("Adding environment configuration source with prefix: {}", prefix);
        self.sources.push(Box::new(EnvSource::new(prefix)));
        self
    }

    /// Add command line source
    pub fn with_cli(mut self, args: Args) -> Self {
        debug!("Adding command line configuration source");
        self.sources.push(Box::new(CliSource::new(args)));
        self
    }

    /// Disable validation
    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RelayConfig> {
        let mut config = RelayConfig::empty();

        debug!("Building configuration from {} sources", self.sources.len());

        for source in self.sources {
            let source_type = source.source_type();
            debug!("Loading configuration from source: {:?}", source_type);

            let source_config = source.load()?;
            config = config.merge(&source_config, source_type);
        }

        config.set_default_values();

        if self.validate {
            debug!("Validating configuration");
            validate_config(&config)?;
        }

        config.log();

        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
            .with_defaults()
            .with_file(DEFAULT_CONFIG_FILE)
            .with_env(ENV_PREFIX)
    }
}

/// Load configuration from every source
///
/// Priority, lowest first:
/// 1. Default values
/// 2. Configuration file (`--config-file`, `BROADCAST_RELAY_CONFIG_FILE`, or `config.json`)
/// 3. Environment variables
/// 4. Command line arguments
pub fn auto_load(args: Args) -> Result<RelayConfig> {
    let config_file = resolve_config_file(&args);
    debug!("Configuration file path: {}", config_file.display());

    ConfigBuilder::new()
        .with_defaults()
        .with_file(&config_file)
        .with_env(ENV_PREFIX)
        .with_cli(args)
        .build()
}

/// Log level to start with, before the configuration is loaded
///
/// Command line first, then `BROADCAST_RELAY_LOG_LEVEL`, then the default.
/// A level set only in the configuration file applies once loading is done.
pub fn early_log_level(args: &Args) -> LevelFilter {
    let from_env = std::env::var(format!("{}LOG_LEVEL", ENV_PREFIX)).ok();
    let level = args
        .log_level
        .as_deref()
        .or(from_env.as_deref())
        .unwrap_or(LOG_LEVEL_STR);

    log_level_filter(level)
}

fn resolve_config_file(args: &Args) -> PathBuf {
    if let Some(path) = &args.config_file {
        return path.clone();
    }

    if let Ok(path) = std::env::var(format!("{}CONFIG_FILE", ENV_PREFIX)) {
        return PathBuf::from(path);
    }

    PathBuf::from(DEFAULT_CONFIG_FILE)
}
