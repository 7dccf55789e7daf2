//! Relay server
//!
//! Owns the upstream connection and the downstream listener, runs the
//! upstream reader and accepts clients until one of them fails.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::common::{RelayError, Result};
use crate::config::RelayConfig;
use crate::relay::pump::{ClientPump, PumpExit, SharedUpstream};
use crate::relay::registry::{Connection, ConnectionRegistry};
use crate::relay::upstream::UpstreamReader;

/// Broadcast relay
///
/// A bound `Relay` is connected to its upstream and listening. [`Relay::run`]
/// drives it until it terminates; there is no reconnect.
pub struct Relay {
    listener: TcpListener,
    listen_addr: SocketAddr,
    upstream_addr: SocketAddr,
    upstream_reader: OwnedReadHalf,
    upstream_writer: SharedUpstream,
    registry: Arc<ConnectionRegistry>,
    buffer_size: usize,
}

impl Relay {
    /// Dial the upstream and bind the listener
    ///
    /// # Errors
    ///
    /// Fails if the upstream cannot be reached or the listen address cannot be bound.
    pub async fn bind(config: &RelayConfig) -> Result<Self> {
        let upstream_addr = config.upstream();
        let upstream = TcpStream::connect(upstream_addr)
            .await
            .map_err(|source| RelayError::UpstreamConnect { addr: upstream_addr, source })?;

        info!("Connected to upstream {}", upstream.peer_addr().unwrap_or(upstream_addr));

        let listen_addr = config.listen();
        let listener = TcpListener::bind(listen_addr)
            .await
            .map_err(|source| RelayError::Bind { addr: listen_addr, source })?;

        Self::from_parts(upstream, listener, config.buffer_size())
    }

    /// Build a relay from an established upstream connection and a bound listener
    ///
    /// # Errors
    ///
    /// Fails with [`RelayError::Config`] if `buffer_size` is 0.
    pub fn from_parts(
        upstream: TcpStream,
        listener: TcpListener,
        buffer_size: usize,
    ) -> Result<Self> {
        // A zero-length read looks exactly like end of stream
        if buffer_size == 0 {
            return Err(RelayError::Config(
                "Buffer size must be greater than 0".to_string(),
            ));
        }

        let upstream_addr = upstream.peer_addr()?;
        let listen_addr = listener.local_addr()?;
        let (upstream_reader, upstream_writer) = upstream.into_split();

        info!("Relay listening on {}", listen_addr);

        Ok(Self {
            listener,
            listen_addr,
            upstream_addr,
            upstream_reader,
            upstream_writer: Arc::new(Mutex::new(upstream_writer)),
            registry: Arc::new(ConnectionRegistry::new()),
            buffer_size,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Address of the upstream application
    pub fn upstream_addr(&self) -> SocketAddr {
        self.upstream_addr
    }

    /// Shared handle to the connection registry
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Run the relay until it terminates
    ///
    /// Returns the error that ended it: upstream closed, upstream read failure
    /// or accept failure. Client pumps still running are aborted on return.
    pub async fn run(self) -> Result<()> {
        let Relay {
            listener,
            upstream_reader,
            upstream_writer,
            registry,
            buffer_size,
            ..
        } = self;

        let reader = UpstreamReader::new(upstream_reader, Arc::clone(&registry), buffer_size);
        let mut reader_task = tokio::spawn(reader.run());
        let mut pumps: JoinSet<PumpExit> = JoinSet::new();

        let result = loop {
            tokio::select! {
                joined = &mut reader_task => {
                    break match joined {
                        Ok(result) => result,
                        Err(e) => Err(RelayError::Other(format!(
                            "Upstream reader task failed: {}",
                            e
                        ))),
                    };
                }

                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            spawn_pump(
                                &mut pumps,
                                stream,
                                addr,
                                &registry,
                                &upstream_writer,
                                buffer_size,
                            );
                        }
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                            reader_task.abort();
                            break Err(RelayError::Accept(e));
                        }
                    }
                }

                Some(joined) = pumps.join_next(), if !pumps.is_empty() => {
                    if let Err(e) = joined {
                        error!("Client pump task error: {}", e);
                    }
                }
            }
        };

        debug!("Relay terminating with {} active clients", registry.len());
        result
    }
}

fn spawn_pump(
    pumps: &mut JoinSet<PumpExit>,
    stream: TcpStream,
    addr: SocketAddr,
    registry: &Arc<ConnectionRegistry>,
    upstream: &SharedUpstream,
    buffer_size: usize,
) {
    let id = Uuid::new_v4().to_string();
    info!("Client connected: id={} addr={}", id, addr);

    let (reader, writer): (OwnedReadHalf, OwnedWriteHalf) = stream.into_split();
    let connection = Arc::new(Connection::new(id, addr.to_string(), writer));

    let registration = match registry.register(Arc::clone(&connection)) {
        Ok(registration) => registration,
        Err(e) => {
            error!("Dropping client {}: {}", addr, e);
            return;
        }
    };

    let pump = ClientPump::new(reader, connection, registration, Arc::clone(upstream), buffer_size);
    pumps.spawn(pump.run());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn upstream_pair() -> (TcpStream, TcpStream) {
        let app = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = app.local_addr().unwrap();
        let (dialed, accepted) = tokio::join!(TcpStream::connect(addr), app.accept());
        (dialed.unwrap(), accepted.unwrap().0)
    }

    #[tokio::test]
    async fn test_from_parts_reports_addresses() {
        let (relay_side, app_side) = upstream_pair().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let listen_addr = listener.local_addr().unwrap();

        let relay = Relay::from_parts(relay_side, listener, 1024).unwrap();
        assert_eq!(relay.local_addr(), listen_addr);
        assert_eq!(relay.upstream_addr(), app_side.local_addr().unwrap());
        assert!(relay.registry().is_empty());
    }

    #[tokio::test]
    async fn test_from_parts_rejects_zero_buffer() {
        let (relay_side, _app_side) = upstream_pair().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        assert!(matches!(
            Relay::from_parts(relay_side, listener, 0),
            Err(RelayError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_bind_fails_without_upstream() {
        // Grab a free port and release it so nothing is listening there
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = probe.local_addr().unwrap();
        drop(probe);

        let mut config = RelayConfig::default();
        config.values.upstream = Some(dead_addr);
        config.values.listen = Some("127.0.0.1:0".parse().unwrap());

        match Relay::bind(&config).await {
            Err(RelayError::UpstreamConnect { addr, .. }) => assert_eq!(addr, dead_addr),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("bind should fail without an upstream"),
        }
    }

    #[tokio::test]
    async fn test_client_roundtrip_through_relay() {
        let (relay_side, mut app_side) = upstream_pair().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let relay = Relay::from_parts(relay_side, listener, 1024).unwrap();
        let addr = relay.local_addr();
        let registry = relay.registry();
        let handle = tokio::spawn(relay.run());

        let mut client = TcpStream::connect(addr).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while registry.is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        client.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        app_side.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        app_side.write_all(b"pong").await.unwrap();
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");

        drop(app_side);
        let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert!(matches!(result, Err(RelayError::UpstreamClosed)));
    }
}
