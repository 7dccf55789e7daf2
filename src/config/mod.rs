//! Configuration module
//!
//! This module handles application configuration, including loading from
//! different sources (files, environment variables, command line arguments)
//! and validating the configuration.

pub mod builder;
pub mod cli;
pub mod defaults;
pub mod error;
pub mod source;
pub mod types;
pub mod validator;

pub use builder::{auto_load, early_log_level, ConfigBuilder};
pub use cli::Args;
pub use defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use error::ConfigError;
pub use source::{CliSource, ConfigSource, DefaultSource, EnvSource, FileSource};
pub use types::{ConfigValues, RelayConfig, ValueSource};
pub use validator::{check_warnings, log_level_filter, validate_config};
