//! Client pump
//!
//! One pump per accepted client: reads from the client and forwards each
//! chunk to the shared upstream connection.

use std::fmt;
use std::io;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::relay::registry::{Connection, Registration};

/// Write side of the upstream connection, shared by every pump
pub type SharedUpstream<U = OwnedWriteHalf> = Arc<Mutex<U>>;

/// Why a pump stopped
#[derive(Debug)]
pub enum PumpExit {
    /// The client closed its end of the connection
    ClientClosed,
    /// Reading from the client failed
    ClientRead(io::Error),
    /// Forwarding to the upstream failed
    UpstreamWrite(io::Error),
}

impl fmt::Display for PumpExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientClosed => write!(f, "client closed the connection"),
            Self::ClientRead(e) => write!(f, "error reading from client: {}", e),
            Self::UpstreamWrite(e) => write!(f, "error writing to upstream: {}", e),
        }
    }
}

/// Read-then-forward loop for one client
pub struct ClientPump<R = OwnedReadHalf, W = OwnedWriteHalf, U = OwnedWriteHalf> {
    reader: R,
    connection: Arc<Connection<W>>,
    registration: Registration<W>,
    upstream: SharedUpstream<U>,
    buffer_size: usize,
}

impl<R, W, U> ClientPump<R, W, U>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    U: AsyncWrite + Unpin + Send,
{
    /// Create a pump over an already registered connection
    pub fn new(
        reader: R,
        connection: Arc<Connection<W>>,
        registration: Registration<W>,
        upstream: SharedUpstream<U>,
        buffer_size: usize,
    ) -> Self {
        Self {
            reader,
            connection,
            registration,
            upstream,
            buffer_size,
        }
    }

    /// Forward client bytes to upstream until either side fails
    ///
    /// On every exit path the client socket is shut down and the registry
    /// entry removed.
    pub async fn run(mut self) -> PumpExit {
        let exit = self.pump().await;
        let id = self.connection.id();
        let addr = self.connection.peer_addr();

        match &exit {
            PumpExit::ClientClosed => info!("Connection closed: id={} addr={}", id, addr),
            PumpExit::ClientRead(e) => error!("Error reading from client {} ({}): {}", id, addr, e),
            PumpExit::UpstreamWrite(e) => {
                error!("Error writing to upstream for client {} ({}): {}", id, addr, e)
            }
        }

        // Deregister before shutting down so no broadcast targets a closing socket
        drop(self.registration);

        if let Err(e) = self.connection.shutdown().await {
            warn!("Error closing connection {}: {}", id, e);
        }

        exit
    }

    async fn pump(&mut self) -> PumpExit {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total_bytes: u64 = 0;

        let exit = loop {
            let n = match self.reader.read(&mut buffer).await {
                Ok(0) => break PumpExit::ClientClosed,
                Ok(n) => n,
                Err(e) => break PumpExit::ClientRead(e),
            };

            // One chunk is written whole while the upstream lock is held
            let mut upstream = self.upstream.lock().await;
            if let Err(e) = upstream.write_all(&buffer[..n]).await {
                break PumpExit::UpstreamWrite(e);
            }
            if let Err(e) = upstream.flush().await {
                break PumpExit::UpstreamWrite(e);
            }
            drop(upstream);

            total_bytes += n as u64;
        };

        debug!(
            "Client {} forwarded {} bytes to upstream",
            self.connection.id(),
            total_bytes
        );
        exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::registry::ConnectionRegistry;
    use tokio::io::{duplex, DuplexStream};
    use tokio_test::io::Builder;

    struct Harness {
        registry: Arc<ConnectionRegistry<DuplexStream>>,
        client_peer: DuplexStream,
    }

    fn pump_for<R, U>(reader: R, upstream: U) -> (ClientPump<R, DuplexStream, U>, Harness)
    where
        R: AsyncRead + Unpin + Send,
        U: AsyncWrite + Unpin + Send,
    {
        let registry = Arc::new(ConnectionRegistry::new());
        let (client_write, client_peer) = duplex(1024);
        let connection = Arc::new(Connection::new("client-1", "127.0.0.1:5555", client_write));
        let registration = registry.register(Arc::clone(&connection)).unwrap();

        let pump = ClientPump::new(
            reader,
            connection,
            registration,
            Arc::new(Mutex::new(upstream)),
            1024,
        );

        (pump, Harness { registry, client_peer })
    }

    #[tokio::test]
    async fn test_forwards_bytes_in_order() {
        let client = Builder::new().read(b"ping").read(b"pong").build();
        let upstream = Builder::new().write(b"ping").write(b"pong").build();

        let (pump, harness) = pump_for(client, upstream);
        assert!(harness.registry.contains("client-1"));

        let exit = pump.run().await;
        assert!(matches!(exit, PumpExit::ClientClosed));
        assert!(harness.registry.is_empty());
    }

    #[tokio::test]
    async fn test_client_read_error_deregisters() {
        let client = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let upstream = Builder::new().build();

        let (pump, harness) = pump_for(client, upstream);
        let exit = pump.run().await;

        assert!(matches!(
            exit,
            PumpExit::ClientRead(ref e) if e.kind() == io::ErrorKind::ConnectionReset
        ));
        assert!(harness.registry.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_write_error_releases_client() {
        let client = Builder::new().read(b"data").build();
        let upstream = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "upstream gone"))
            .build();

        let (pump, mut harness) = pump_for(client, upstream);
        let exit = pump.run().await;

        assert!(matches!(exit, PumpExit::UpstreamWrite(_)));
        assert!(harness.registry.is_empty());

        // The client side sees end of stream once the pump has shut it down
        let mut rest = Vec::new();
        harness.client_peer.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn test_exit_display() {
        assert_eq!(PumpExit::ClientClosed.to_string(), "client closed the connection");
        let exit = PumpExit::UpstreamWrite(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(exit.to_string().contains("gone"));
    }
}
