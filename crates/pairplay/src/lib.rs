//! # Pairplay
//!
//! Real-time matchmaking server for two-player browser games.
//!
//! Clients hold a WebSocket open and exchange JSON events of the form
//! `{"event": "<name>", "data": {...}}`. The server pairs them into
//! two-seat rooms (quick match, password-protected custom rooms, or
//! rejoin), relays game moves between the pair, keeps scores, and ends
//! a room as soon as either player leaves.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairplay::prelude::*;
//!
//! # async fn run() -> Result<(), PairplayError> {
//! let server = PairplayServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
pub mod logging;
mod server;

pub use error::PairplayError;
pub use server::{PairplayServer, PairplayServerBuilder, ServerConfig, ServerStore};

/// Re-exports the types most servers and clients need.
pub mod prelude {
    pub use crate::{PairplayError, PairplayServer, PairplayServerBuilder, ServerConfig};
    pub use pairplay_protocol::{ClientEvent, GameError, RoomId, RoomSummary, ServerEvent, UserId};
    pub use pairplay_room::{ErrorKind, Room, RoomConfig, RoomError, RoomManager};
    pub use pairplay_store::{MemoryStore, RoomStore, StoreError, TimedStore};
}
