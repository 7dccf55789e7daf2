//! Relay module
//!
//! The connection registry and the two forwarding directions:
//! upstream to every client (broadcast) and each client to upstream (pump).

mod pump;
mod registry;
mod server;
mod upstream;

pub use pump::{ClientPump, PumpExit, SharedUpstream};
pub use registry::{Connection, ConnectionRegistry, Registration};
pub use server::Relay;
pub use upstream::{broadcast, BroadcastReport, UpstreamReader};
