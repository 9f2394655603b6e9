//! Two-player rooms for Pairplay: matchmaking, membership, and relay.
//!
//! Rooms hold at most two members. Users get into one by quick match
//! (any public room with a free seat, or a new one), by custom join (a
//! private room id plus its password), or by rejoin (restoring membership
//! they already hold). When either member leaves or drops, the room ends.
//!
//! # Key types
//!
//! - [`RoomManager`]: every room operation; generic over the store
//! - [`RoomRepository`]: typed access to room records in a [`RoomStore`](pairplay_store::RoomStore)
//! - [`Hub`]: live connections and their room groups
//! - [`Room`]: the stored room record
//! - [`RoomConfig`]: capacity, TTL, retry limits
//! - [`RoomError`] / [`ErrorKind`]: failures, by category

mod allocator;
mod config;
mod custom;
mod disconnect;
mod error;
mod hub;
mod manager;
mod record;
mod rejoin;
mod relay;
mod repository;

pub use config::RoomConfig;
pub use error::{ErrorKind, RoomError};
pub use hub::{EventSender, Hub};
pub use manager::RoomManager;
pub use record::Room;
pub use repository::{Admission, RoomRepository};
