//! Default configuration values
//!
//! Single source of truth for defaults.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Environment variable prefix for all configuration options
pub const ENV_PREFIX: &str = "BROADCAST_RELAY_";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default listen address for downstream clients
pub const LISTEN: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9090));

/// Default upstream application address
pub const UPSTREAM: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9990));

/// Default log level
pub const LOG_LEVEL_STR: &str = "debug";

/// Default read buffer size in bytes, shared by the upstream reader and every pump
pub const BUFFER_SIZE: usize = 1024;

/// Log levels accepted without a warning
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
