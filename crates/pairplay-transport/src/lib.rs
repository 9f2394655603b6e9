//! Connection plumbing for Pairplay.
//!
//! A browser client holds one socket open for its whole session and
//! exchanges one JSON event per text frame. This crate hides the socket
//! library behind two small traits:
//!
//! - [`Transport`] hands out newly accepted connections
//! - [`Connection`] moves text frames in both directions
//!
//! Everything above this layer identifies a socket only by its
//! [`ConnectionId`].
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketTransport`] on `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Process-local handle for one live socket.
///
/// Never persisted, never reused while the process runs. Ordered so that
/// member lists built from it come out stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of incoming connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client and completes its handshake.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One client socket carrying text frames.
///
/// `send` and `recv` may run at the same time from different tasks: the
/// writer task drains the outbound queue while the handler waits for the
/// next inbound frame.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Next text frame, or `Ok(None)` once the peer has closed.
    ///
    /// Binary frames are accepted if they hold valid UTF-8.
    async fn recv(&self) -> Result<Option<String>, Self::Error>;

    /// Starts the closing handshake.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_connection_id_round_trips_raw_value() {
        assert_eq!(ConnectionId::new(42).into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display_is_log_friendly() {
        assert_eq!(format!("{}", ConnectionId::new(7)), "conn-7");
    }

    #[test]
    fn test_connection_ids_sort_numerically() {
        let set: BTreeSet<_> = [9, 2, 10].into_iter().map(ConnectionId::new).collect();
        let raw: Vec<u64> = set.into_iter().map(ConnectionId::into_inner).collect();
        assert_eq!(raw, vec![2, 9, 10]);
    }
}
