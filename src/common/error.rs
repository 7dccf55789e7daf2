//! Error handling module
//!
//! This module defines the error types and result type aliases used in the application.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Broadcast relay error type
#[derive(Error, Debug)]
pub enum RelayError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dialing the upstream application failed
    #[error("Failed to connect to upstream {addr}: {source}")]
    UpstreamConnect {
        /// Upstream address
        addr: SocketAddr,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Binding the downstream listener failed
    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        /// Listen address
        addr: SocketAddr,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Accepting a downstream connection failed
    #[error("Error accepting connection: {0}")]
    Accept(#[source] io::Error),

    /// The upstream application closed its end of the connection
    #[error("Upstream connection closed")]
    UpstreamClosed,

    /// Reading from the upstream application failed
    #[error("Error reading from upstream: {0}")]
    UpstreamRead(#[source] io::Error),

    /// A connection identifier was registered twice
    #[error("Connection already registered: {0}")]
    DuplicateConnection(String),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `RelayError`.
pub type Result<T> = std::result::Result<T, RelayError>;
