//! Upstream reader
//!
//! Reads the upstream application's stream and broadcasts every chunk to the
//! registered clients, one write per client per chunk.

use std::sync::Arc;

use log::{debug, error, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::common::{RelayError, Result};
use crate::relay::registry::ConnectionRegistry;

/// Outcome of broadcasting one chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients that received the chunk
    pub delivered: usize,
    /// Clients whose write failed
    pub failed: usize,
}

/// Write `chunk` to every connection in a registry snapshot
///
/// Writes happen one client after another. A failed write is logged and
/// skipped; the failing client stays registered until its own pump ends.
pub async fn broadcast<W>(registry: &ConnectionRegistry<W>, chunk: &[u8]) -> BroadcastReport
where
    W: AsyncWrite + Unpin + Send,
{
    let mut report = BroadcastReport::default();

    for connection in registry.snapshot() {
        match connection.write_chunk(chunk).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                error!(
                    "Error writing to connection {} ({}): {}",
                    connection.id(),
                    connection.peer_addr(),
                    e
                );
                report.failed += 1;
            }
        }
    }

    report
}

/// Single loop reading from the upstream connection
pub struct UpstreamReader<R = OwnedReadHalf, W = OwnedWriteHalf> {
    reader: R,
    registry: Arc<ConnectionRegistry<W>>,
    buffer_size: usize,
}

impl<R, W> UpstreamReader<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a new upstream reader
    ///
    /// `buffer_size` must be non-zero; [`Relay::from_parts`](crate::Relay::from_parts) checks it.
    pub fn new(reader: R, registry: Arc<ConnectionRegistry<W>>, buffer_size: usize) -> Self {
        Self {
            reader,
            registry,
            buffer_size,
        }
    }

    /// Read and broadcast until the upstream goes away
    ///
    /// Never returns `Ok`. End of stream yields [`RelayError::UpstreamClosed`],
    /// any other read failure [`RelayError::UpstreamRead`].
    pub async fn run(mut self) -> Result<()> {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total_bytes: u64 = 0;

        loop {
            match self.reader.read(&mut buffer).await {
                Ok(0) => {
                    error!("Upstream connection closed after {} bytes", total_bytes);
                    return Err(RelayError::UpstreamClosed);
                }
                Ok(n) => {
                    total_bytes += n as u64;
                    let report = broadcast(&self.registry, &buffer[..n]).await;
                    if report.failed > 0 {
                        warn!(
                            "Broadcast of {} bytes reached {} of {} clients",
                            n,
                            report.delivered,
                            report.delivered + report.failed
                        );
                    } else {
                        debug!("Broadcast {} bytes to {} clients", n, report.delivered);
                    }
                }
                Err(e) => {
                    error!("Error reading from upstream: {}", e);
                    return Err(RelayError::UpstreamRead(e));
                }
            }
        }
    }
}
