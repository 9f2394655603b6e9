//! Channel protocol for Pairplay.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Identifiers** ([`UserId`], [`RoomId`]): the logical user supplied by
//!   clients and the canonical room identifier.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): one tagged variant per
//!   event name, each with a fixed payload schema.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become text frames.
//! - **Errors** ([`ProtocolError`]).
//!
//! On the wire every event is a JSON object of the form
//! `{"event": "<name>", "data": { ...payload... }}`.

mod codec;
mod error;
mod events;
mod ids;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use events::{
    ChatRequest, ClientEvent, CreateRoomRequest, CustomJoinRequest, GameError, GameOverRequest,
    GameResult, GameSnapshot, LeaveRequest, ListRoomsRequest, MoveRequest, PingRequest,
    PlayGameRequest, PlayerSlot, QuickMatchRequest, RejoinRequest, RoomSummary, ScoreEntry,
    ServerEvent, Symbol,
};
pub use ids::{RoomId, RoomType, UserId};
