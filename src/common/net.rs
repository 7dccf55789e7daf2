//! Network utility functions
//!
//! This module provides utility functions for network operations.

use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use super::error::{RelayError, Result};

/// Parse a socket address
///
/// Accepts literal `ip:port` pairs as well as resolvable `host:port` names.
/// The first resolved address wins.
///
/// # Arguments
///
/// * `addr` - The address string to parse
pub fn parse_socket_addr(addr: &str) -> Result<SocketAddr> {
    if let Ok(socket_addr) = SocketAddr::from_str(addr) {
        return Ok(socket_addr);
    }

    match addr.to_socket_addrs() {
        Ok(mut addrs) => addrs
            .next()
            .ok_or_else(|| RelayError::Config(format!("Failed to parse address: {}", addr))),
        Err(e) => Err(RelayError::Config(format!("Failed to parse address {}: {}", addr, e))),
    }
}
