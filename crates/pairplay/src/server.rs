//! `PairplayServer` builder and accept loop.
//!
//! Ties the layers together: the WebSocket transport accepts connections,
//! each connection gets a handler task, and every handler shares one
//! [`RoomManager`] backed by a timed in-memory store.

use std::sync::Arc;
use std::time::Duration;

use pairplay_protocol::{Codec, JsonCodec};
use pairplay_room::{RoomConfig, RoomManager};
use pairplay_store::{MemoryStore, TimedStore};
use pairplay_transport::{Transport, WebSocketTransport};
use tokio::task::JoinHandle;

use crate::PairplayError;
use crate::handler::handle_connection;

/// The store every server instance runs on.
pub type ServerStore = TimedStore<MemoryStore>;

/// Server-wide settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: String,
    /// How long a connection may stay silent before it is dropped.
    pub idle_timeout: Duration,
    /// Upper bound on a single storage call.
    pub store_timeout: Duration,
    /// How often expired keys are purged from the store.
    pub sweep_interval: Duration,
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            idle_timeout: Duration::from_secs(60),
            store_timeout: Duration::from_secs(2),
            sweep_interval: Duration::from_secs(30),
            room: RoomConfig::default(),
        }
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: RoomManager<ServerStore>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Pairplay server.
///
/// # Example
///
/// ```rust,no_run
/// use pairplay::prelude::*;
///
/// # async fn run() -> Result<(), PairplayError> {
/// let server = PairplayServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct PairplayServerBuilder {
    config: ServerConfig,
}

impl PairplayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.config.store_timeout = timeout;
        self
    }

    pub fn sweep_interval(mut self, every: Duration) -> Self {
        self.config.sweep_interval = every;
        self
    }

    /// Replaces the room settings (capacity, TTL, retries).
    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    /// Binds the listener and wires up the store and room manager.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<PairplayServer<JsonCodec>, PairplayError> {
        let ServerConfig {
            bind_addr,
            idle_timeout,
            store_timeout,
            sweep_interval,
            room,
        } = self.config;

        let transport = WebSocketTransport::bind(&bind_addr).await?;
        let memory = MemoryStore::new();
        let sweeper = memory.spawn_sweeper(sweep_interval);
        let store = TimedStore::new(memory, store_timeout);

        let state = Arc::new(ServerState {
            rooms: RoomManager::new(store, room),
            codec: JsonCodec,
            idle_timeout,
        });

        Ok(PairplayServer {
            transport,
            state,
            sweeper,
        })
    }
}

impl Default for PairplayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Pairplay server.
///
/// Call [`run()`](Self::run) to start accepting connections. Dropping the
/// server stops the store's expiry sweeper.
pub struct PairplayServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
    sweeper: JoinHandle<()>,
}

impl PairplayServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> PairplayServerBuilder {
        PairplayServerBuilder::new()
    }
}

impl<C: Codec> PairplayServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), PairplayError> {
        tracing::info!(
            room_ttl_secs = self.state.rooms.config().room_ttl.as_secs(),
            idle_timeout_secs = self.state.idle_timeout.as_secs(),
            store_timeout_ms = self.state.rooms.repository().store().limit().as_millis() as u64,
            "Pairplay server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

impl<C: Codec> Drop for PairplayServer<C> {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}
