//! Connection identity for Pairplay.
//!
//! The storage layer only ever sees user ids. The one place that knows
//! "this live connection is user U" is the [`ConnectionRegistry`] in this
//! crate. It is process-local and never persisted; an entry is created when
//! a connection joins, creates or rejoins a room and dropped when the
//! connection goes away.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← resolves connections to users before relaying
//!     ↕
//! Session Layer (this crate)  ← connection id → user id
//!     ↕
//! Transport / Protocol (below)  ← ConnectionId, UserId
//! ```

mod error;
mod registry;

pub use error::SessionError;
pub use registry::ConnectionRegistry;
