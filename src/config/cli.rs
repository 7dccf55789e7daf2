//! Command line arguments
//!
//! Only options given on the command line are set; everything else falls
//! through to the lower priority sources.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::types::{parse_socket_addr, ConfigValues};

/// Broadcast Relay: one upstream stream fanned out to many TCP clients
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "broadcast-relay", author, version, about, long_about = None)]
pub struct Args {
    /// Listen address for downstream clients (host:port)
    #[arg(short, long, value_parser = parse_addr_arg)]
    pub listen: Option<SocketAddr>,

    /// Upstream application address (host:port)
    #[arg(short, long, value_parser = parse_addr_arg)]
    pub upstream: Option<SocketAddr>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Read buffer size in bytes
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Load configuration from a JSON file
    #[arg(long)]
    pub config_file: Option<PathBuf>,
}

fn parse_addr_arg(s: &str) -> std::result::Result<SocketAddr, String> {
    parse_socket_addr(s).map_err(|e| e.to_string())
}

impl Args {
    /// The configuration values carried by these arguments
    pub fn values(&self) -> ConfigValues {
        ConfigValues {
            listen: self.listen,
            upstream: self.upstream,
            log_level: self.log_level.clone(),
            buffer_size: self.buffer_size,
        }
    }
}
