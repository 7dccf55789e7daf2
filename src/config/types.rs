//! Configuration types
//!
//! This module contains the main configuration types used throughout the application.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::defaults::{BUFFER_SIZE, LISTEN, LOG_LEVEL_STR, UPSTREAM};
use crate::config::error::{ConfigError, Result};

/// Source of a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    /// Default value
    Default,
    /// From configuration file
    File,
    /// From environment variable
    Environment,
    /// From command line argument
    CommandLine,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Default => write!(f, "default"),
            ValueSource::File => write!(f, "file"),
            ValueSource::Environment => write!(f, "environment"),
            ValueSource::CommandLine => write!(f, "command line"),
        }
    }
}

/// Custom deserializer for socket addresses given as `host:port` strings
fn deserialize_socket_addr<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<SocketAddr>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    match s {
        Some(addr_str) => parse_socket_addr(&addr_str)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Parse a socket address string into a configuration value
pub fn parse_socket_addr(addr: &str) -> Result<SocketAddr> {
    crate::common::parse_socket_addr(addr)
        .map_err(|e| ConfigError::InvalidValue("socket_addr".to_string(), e.to_string()))
}

/// Configuration values
///
/// Every field is optional so that each source only carries what it sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigValues {
    /// Downstream listen address (host:port)
    #[serde(default, deserialize_with = "deserialize_socket_addr")]
    pub listen: Option<SocketAddr>,

    /// Upstream application address (host:port)
    #[serde(default, deserialize_with = "deserialize_socket_addr")]
    pub upstream: Option<SocketAddr>,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default)]
    pub log_level: Option<String>,

    /// Read buffer size in bytes for both directions
    #[serde(default)]
    pub buffer_size: Option<usize>,
}

/// Relay configuration
///
/// Values plus the source each value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Configuration values
    pub values: ConfigValues,

    /// Configuration file path
    pub config_file: Option<PathBuf>,

    /// Source tracking for configuration values
    pub sources: HashMap<String, ValueSource>,
}

impl Deref for RelayConfig {
    type Target = ConfigValues;

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl Serialize for RelayConfig {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.values.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RelayConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = ConfigValues::deserialize(deserializer)?;
        Ok(Self::from_values(values))
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        let mut config = Self::empty();
        config.set_default_values();
        config
    }
}

impl RelayConfig {
    /// A configuration with no values and no sources
    pub fn empty() -> Self {
        Self::from_values(ConfigValues::default())
    }

    /// Wrap raw values without recording any sources
    pub fn from_values(values: ConfigValues) -> Self {
        Self {
            values,
            config_file: None,
            sources: HashMap::new(),
        }
    }

    /// Fill every unset value with its default and record the source
    pub fn set_default_values(&mut self) {
        if self.values.listen.is_none() {
            self.values.listen = Some(LISTEN);
            self.sources.insert("listen".to_string(), ValueSource::Default);
        }

        if self.values.upstream.is_none() {
            self.values.upstream = Some(UPSTREAM);
            self.sources.insert("upstream".to_string(), ValueSource::Default);
        }

        if self.values.log_level.is_none() {
            self.values.log_level = Some(LOG_LEVEL_STR.to_string());
            self.sources.insert("log_level".to_string(), ValueSource::Default);
        }

        if self.values.buffer_size.is_none() {
            self.values.buffer_size = Some(BUFFER_SIZE);
            self.sources.insert("buffer_size".to_string(), ValueSource::Default);
        }
    }

    /// Record `source` for every value currently set
    pub(crate) fn mark_sources(&mut self, source: ValueSource) {
        let set = [
            ("listen", self.values.listen.is_some()),
            ("upstream", self.values.upstream.is_some()),
            ("log_level", self.values.log_level.is_some()),
            ("buffer_size", self.values.buffer_size.is_some()),
        ];

        for (name, has_value) in set {
            if has_value {
                self.sources.insert(name.to_string(), source);
            }
        }
    }

    /// Get the source of a configuration value
    pub fn source(&self, name: &str) -> Option<ValueSource> {
        self.sources.get(name).copied()
    }

    fn source_label(&self, name: &str) -> String {
        self.source(name)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Get the downstream listen address
    pub fn listen(&self) -> SocketAddr {
        self.values.listen.unwrap_or(LISTEN)
    }

    /// Get the upstream application address
    pub fn upstream(&self) -> SocketAddr {
        self.values.upstream.unwrap_or(UPSTREAM)
    }

    /// Get the log level
    pub fn log_level(&self) -> &str {
        self.values.log_level.as_deref().unwrap_or(LOG_LEVEL_STR)
    }

    /// Get the read buffer size
    pub fn buffer_size(&self) -> usize {
        self.values.buffer_size.unwrap_or(BUFFER_SIZE)
    }

    /// Get the configuration file path
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Merge two configurations
    ///
    /// Values set in `other` win and are attributed to `source`.
    pub fn merge(&self, other: &RelayConfig, source: ValueSource) -> Self {
        let mut result = self.clone();

        macro_rules! merge_field {
            ($name:ident) => {
                if other.values.$name.is_some() {
                    result.values.$name = other.values.$name.clone();
                    result.sources.insert(stringify!($name).to_string(), source);
                }
            };
        }

        merge_field!(listen);
        merge_field!(upstream);
        merge_field!(log_level);
        merge_field!(buffer_size);

        if let Some(path) = &other.config_file {
            result.config_file = Some(path.clone());
        }

        result
    }

    /// Log the configuration
    pub fn log(&self) {
        debug!("=== Configuration ===");
        debug!("  Listen address: {} (from {})", self.listen(), self.source_label("listen"));
        debug!("  Upstream address: {} (from {})", self.upstream(), self.source_label("upstream"));
        debug!("  Log level: {} (from {})", self.log_level(), self.source_label("log_level"));
        debug!(
            "  Buffer size: {} bytes (from {})",
            self.buffer_size(),
            self.source_label("buffer_size")
        );

        if let Some(file) = self.config_file() {
            debug!("  Configuration file: {}", file.display());
        }

        debug!("=====================");
    }
}
