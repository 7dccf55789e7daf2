//! Broadcast Relay: one upstream TCP stream shared by many clients
//!
//! Every byte the upstream application sends is written, unchanged, to every
//! connected client. Every byte a client sends is forwarded, unchanged, to the
//! upstream. Replies are not routed back to the client that caused them; the
//! relay does no framing or protocol parsing.
//!
//! # Example
//!
//! ```no_run
//! use broadcast_relay::{Relay, Result};
//! use broadcast_relay::config::RelayConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Upstream 127.0.0.1:9990, clients on 127.0.0.1:9090
//!     let config = RelayConfig::default();
//!
//!     let relay = Relay::bind(&config).await?;
//!     relay.run().await
//! }
//! ```

pub mod common;
pub mod config;
pub mod relay;

// Re-export commonly used structures and functions for convenience
pub use common::{parse_socket_addr, RelayError, Result};
pub use relay::{ConnectionRegistry, Relay};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
