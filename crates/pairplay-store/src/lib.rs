//! Shared storage for Pairplay.
//!
//! The room layer never talks to a concrete database. It consumes the
//! [`RoomStore`] contract: hashes, lists, per-key expiry, and one atomic
//! conditional update. Any key/value store with those primitives can back
//! it; [`MemoryStore`] is the in-process implementation.
//!
//! # Key types
//!
//! - [`RoomStore`]: the storage contract
//! - [`MemoryStore`]: in-memory store with lazy expiry and a sweeper
//! - [`TimedStore`]: wraps any store with a per-call timeout
//! - [`StoreError`]: storage failures

mod error;
mod memory;
mod store;
mod timed;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{Fields, RoomStore};
pub use timed::TimedStore;
