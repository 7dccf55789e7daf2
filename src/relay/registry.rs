//! Connection registry
//!
//! Maps connection identifiers to the write side of every live downstream
//! client. The acceptor inserts, each client pump removes its own entry and the
//! upstream reader iterates for broadcast. All three may run at once.

use std::fmt;
use std::io;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use crate::common::{RelayError, Result};

/// Write side of one downstream client
///
/// Writes are serialized per connection so a broadcast chunk is never
/// interleaved with another chunk on the same socket.
pub struct Connection<W = OwnedWriteHalf> {
    id: String,
    peer_addr: String,
    writer: Mutex<W>,
}

impl<W> Connection<W> {
    /// Create a new connection handle
    pub fn new(id: impl Into<String>, peer_addr: impl Into<String>, writer: W) -> Self {
        Self {
            id: id.into(),
            peer_addr: peer_addr.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Connection identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Remote address, informational only
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl<W> Connection<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Write one chunk in full
    pub async fn write_chunk(&self, chunk: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(chunk).await?;
        writer.flush().await
    }

    /// Shut down the write direction of the socket
    pub async fn shutdown(&self) -> io::Result<()> {
        self.writer.lock().await.shutdown().await
    }
}

impl<W> fmt::Debug for Connection<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}

/// Concurrent mapping from connection identifier to connection
pub struct ConnectionRegistry<W = OwnedWriteHalf> {
    connections: DashMap<String, Arc<Connection<W>>>,
}

impl<W> Default for ConnectionRegistry<W> {
    fn default() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }
}

impl<W> ConnectionRegistry<W> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection under its own identifier
    ///
    /// Fails if the identifier is already registered.
    pub fn insert(&self, connection: Arc<Connection<W>>) -> Result<()> {
        match self.connections.entry(connection.id().to_string()) {
            Entry::Occupied(entry) => Err(RelayError::DuplicateConnection(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(connection);
                Ok(())
            }
        }
    }

    /// Remove a connection, returning it if it was present
    ///
    /// Removing an absent identifier is a no-op.
    pub fn remove(&self, id: &str) -> Option<Arc<Connection<W>>> {
        self.connections.remove(id).map(|(_, connection)| connection)
    }

    /// Point-in-time copy of every registered connection
    ///
    /// No internal lock is held once this returns, so the result can be used
    /// across await points.
    pub fn snapshot(&self) -> Vec<Arc<Connection<W>>> {
        self.connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Invoke `f` for each entry of a snapshot
    ///
    /// Order is unspecified. `f` may insert into or remove from the registry.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Arc<Connection<W>>),
    {
        for connection in self.snapshot() {
            f(connection.id(), &connection);
        }
    }

    /// Whether `id` is currently registered
    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    /// Identifiers of all registered connections
    pub fn ids(&self) -> Vec<String> {
        self.connections.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connection is registered
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Insert `connection` and tie its removal to the returned guard
    pub fn register(self: &Arc<Self>, connection: Arc<Connection<W>>) -> Result<Registration<W>> {
        let id = connection.id().to_string();
        self.insert(connection)?;
        Ok(Registration {
            registry: Arc::clone(self),
            id,
        })
    }
}

/// Registry entry owned by a client pump
///
/// Dropping the guard removes the entry, whichever way the pump ends.
pub struct Registration<W = OwnedWriteHalf> {
    registry: Arc<ConnectionRegistry<W>>,
    id: String,
}

impl<W> Registration<W> {
    /// Identifier of the guarded entry
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<W> Drop for Registration<W> {
    fn drop(&mut self) {
        if self.registry.remove(&self.id).is_some() {
            debug!("Connection {} removed from registry", self.id);
        }
    }
}
