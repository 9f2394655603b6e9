//! Channel events: one tagged variant per event name.
//!
//! Events are "adjacently tagged": the event name sits under `event` and the
//! payload under `data`:
//!
//! ```json
//! { "event": "join_into_custom_room",
//!   "data": { "userId": "alice", "id": "9f1c…", "password": "secret1" } }
//! ```
//!
//! Each payload has a fixed schema. Unknown event names and payload fields of
//! the wrong type fail to decode. Identifier fields default to empty when
//! missing so the room layer can reject them with its own "invalid data"
//! error and echo the payload back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{RoomId, RoomType, UserId};

// ---------------------------------------------------------------------------
// Client → server payloads
// ---------------------------------------------------------------------------

/// `join_into_room`: quick match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickMatchRequest {
    #[serde(default)]
    pub user: UserId,
}

/// `join_into_custom_room`: join a named, password-protected room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomJoinRequest {
    #[serde(default)]
    pub user_id: UserId,
    /// Display name the client believes the room has. Informational only.
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "id", alias = "roomId")]
    pub room_id: RoomId,
}

/// `rejoin_into_room`: restore membership after a reconnect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejoinRequest {
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub room_id: RoomId,
}

/// `play_game`: start (or restart) the match in a full room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayGameRequest {
    #[serde(default)]
    pub room_id: RoomId,
    #[serde(default)]
    pub user_id: UserId,
}

/// `game_playing`: a move, carrying the client's view of the shared state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    #[serde(default)]
    pub room_id: RoomId,
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub data: Value,
}

/// `game_over`: the outcome of a finished match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameOverRequest {
    #[serde(default)]
    pub player1: UserId,
    #[serde(default)]
    pub player2: UserId,
    #[serde(default)]
    pub winner: Option<UserId>,
    #[serde(default)]
    pub draw: bool,
}

/// `player_left`: voluntary leave.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    #[serde(default, alias = "roomName")]
    pub room_id: RoomId,
}

/// `chat`: relayed to everyone in the room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default, alias = "roomName")]
    pub room_id: RoomId,
}

/// `create_custom_room`: create a private room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub password: String,
}

/// `list_my_rooms`: rooms the user created or joined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRoomsRequest {
    #[serde(default)]
    pub user_id: UserId,
}

/// `ping`: keep-alive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingRequest {
    #[serde(default)]
    pub client_time: u64,
}

/// Every event a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinIntoRoom(QuickMatchRequest),
    JoinIntoCustomRoom(CustomJoinRequest),
    RejoinIntoRoom(RejoinRequest),
    PlayGame(PlayGameRequest),
    GamePlaying(MoveRequest),
    GameOver(GameOverRequest),
    PlayerLeft(LeaveRequest),
    Chat(ChatRequest),
    CreateCustomRoom(CreateRoomRequest),
    ListMyRooms(ListRoomsRequest),
    Ping(PingRequest),
}

impl ClientEvent {
    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinIntoRoom(_) => "join_into_room",
            Self::JoinIntoCustomRoom(_) => "join_into_custom_room",
            Self::RejoinIntoRoom(_) => "rejoin_into_room",
            Self::PlayGame(_) => "play_game",
            Self::GamePlaying(_) => "game_playing",
            Self::GameOver(_) => "game_over",
            Self::PlayerLeft(_) => "player_left",
            Self::Chat(_) => "chat",
            Self::CreateCustomRoom(_) => "create_custom_room",
            Self::ListMyRooms(_) => "list_my_rooms",
            Self::Ping(_) => "ping",
        }
    }

    /// The payload as a JSON value, echoed back in `game_error` events.
    pub fn payload(&self) -> Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut v| v.get_mut("data").map(Value::take))
            .unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Server → client payloads
// ---------------------------------------------------------------------------

/// The marker a player places. X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    pub user_id: UserId,
    pub symbol: Symbol,
}

/// The shared state of a running match, broadcast on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub room_id: RoomId,
    pub players: Vec<PlayerSlot>,
    /// The player expected to move next.
    pub turn: UserId,
    /// Number of accepted moves so far.
    pub moves: u32,
    /// The board as last submitted by a mover; opaque to the server.
    pub data: Value,
}

/// A player's running score after a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub user_id: UserId,
    pub points: u64,
}

/// Outcome of a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub room_id: RoomId,
    pub winner: Option<UserId>,
    pub draw: bool,
    pub scores: Vec<ScoreEntry>,
}

/// A room as shown in listings. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub room_name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub client_count: u8,
}

/// Error payload sent only to the connection whose event failed.
///
/// `data` echoes the offending payload so the client can correlate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameError {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

impl GameError {
    /// Builds an error payload; `success` is always `false`.
    pub fn new(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
        }
    }
}

/// Every event the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    EmitJoinedIntoRoom {
        room_id: RoomId,
        room_name: String,
    },
    NumberOfClients {
        room_id: RoomId,
        room_name: String,
        count: usize,
    },
    MatchFound {
        room_id: RoomId,
        room_name: String,
        message: String,
    },
    PlayerLeft {
        message: String,
    },
    GameError(GameError),
    GameStarted(GameSnapshot),
    GamePlaying(GameSnapshot),
    GameOver(GameResult),
    Chat {
        user_name: String,
        msg: String,
    },
    RoomCreated {
        room_id: RoomId,
        room_name: String,
    },
    RoomList {
        rooms: Vec<RoomSummary>,
    },
    Pong {
        client_time: u64,
        server_time: u64,
    },
}

impl ServerEvent {
    /// Shorthand for a `game_error` event.
    pub fn error(message: impl Into<String>, data: Value) -> Self {
        Self::GameError(GameError::new(message, data))
    }
}
