//! Error types for the session layer.

use pairplay_protocol::UserId;
use pairplay_transport::ConnectionId;

/// Errors raised when resolving connection identity.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection never joined, created or rejoined a room, or it has
    /// already been unregistered.
    #[error("connection {0} has no registered user")]
    Unregistered(ConnectionId),

    /// The connection is registered, but as a different user than the one
    /// the event claims to act for.
    #[error("connection {conn} is registered as {registered}, not {claimed}")]
    IdentityMismatch {
        conn: ConnectionId,
        registered: UserId,
        claimed: UserId,
    },
}
