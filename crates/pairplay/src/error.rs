//! Unified error type for the Pairplay server.

use pairplay_protocol::ProtocolError;
use pairplay_room::RoomError;
use pairplay_session::SessionError;
use pairplay_store::StoreError;
use pairplay_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PairplayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A storage error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A connection identity error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, wrong password, ...).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// An OS-level I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
