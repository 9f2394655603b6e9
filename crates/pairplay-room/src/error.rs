//! Error types for the room layer.
//!
//! Every variant belongs to one [`ErrorKind`]. The handler turns any
//! `RoomError` into a `game_error` for the originating connection using
//! [`RoomError::message`], which never carries internal detail; the
//! `Display` text is for logs.

use pairplay_protocol::{RoomId, UserId};
use pairplay_session::SessionError;
use pairplay_store::StoreError;

/// The category of a room error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input, rejected before any storage access.
    Validation,
    /// Room or user absent in storage.
    NotFound,
    /// Room full.
    Capacity,
    /// Password mismatch.
    Auth,
    /// Storage failure or unconfirmed write.
    Storage,
    /// The room is not in a state that allows the operation.
    State,
}

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A required field is missing or malformed.
    #[error("invalid data: {0}")]
    Validation(String),

    /// No room record exists under this id (never created, deleted, or expired).
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The room exists but the user is not one of its members.
    #[error("user {user} not found in room {room}")]
    NotMember { user: UserId, room: RoomId },

    /// The room already holds its maximum number of members.
    #[error("room {0} is full")]
    Capacity(RoomId),

    /// The supplied password does not match the stored one.
    #[error("invalid password for room {0}")]
    Auth(RoomId),

    /// The store failed or timed out.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A conditional write kept losing races and was never confirmed.
    #[error("write to {0} not confirmed")]
    Unconfirmed(String),

    /// A stored record could not be parsed.
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// The connection's identity could not be resolved or does not match.
    #[error(transparent)]
    Identity(#[from] SessionError),

    /// The operation does not fit the room's current state.
    #[error("{0}")]
    State(String),
}

impl RoomError {
    /// Shorthand for [`RoomError::Validation`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Shorthand for [`RoomError::State`].
    pub fn state(reason: impl Into<String>) -> Self {
        Self::State(reason.into())
    }

    /// The error's category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::RoomNotFound(_) | Self::NotMember { .. } => ErrorKind::NotFound,
            Self::Capacity(_) => ErrorKind::Capacity,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Storage(_) | Self::Unconfirmed(_) | Self::Corrupt { .. } => ErrorKind::Storage,
            Self::Identity(_) | Self::State(_) => ErrorKind::State,
        }
    }

    /// The message shown to the client.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(_) => "invalid data".to_string(),
            Self::RoomNotFound(_) => "room not found".to_string(),
            Self::NotMember { .. } => "user not found in room".to_string(),
            Self::Capacity(_) => "room is full".to_string(),
            Self::Auth(_) => "Invalid password".to_string(),
            Self::Storage(_) | Self::Unconfirmed(_) | Self::Corrupt { .. } => {
                "storage unavailable, try again".to_string()
            }
            Self::Identity(_) => "user not registered on this connection".to_string(),
            Self::State(reason) => reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pairplay_transport::ConnectionId;

    use super::*;

    #[test]
    fn test_kinds_cover_taxonomy() {
        let room = RoomId::new("r1");
        assert_eq!(RoomError::invalid("x").kind(), ErrorKind::Validation);
        assert_eq!(RoomError::RoomNotFound(room.clone()).kind(), ErrorKind::NotFound);
        assert_eq!(RoomError::Capacity(room.clone()).kind(), ErrorKind::Capacity);
        assert_eq!(RoomError::Auth(room).kind(), ErrorKind::Auth);
        assert_eq!(RoomError::Unconfirmed("room:r1".into()).kind(), ErrorKind::Storage);
        assert_eq!(RoomError::state("not your turn").kind(), ErrorKind::State);
    }

    #[test]
    fn test_messages_are_user_facing() {
        let room = RoomId::new("r1");
        assert_eq!(RoomError::invalid("userId missing").message(), "invalid data");
        assert_eq!(RoomError::Capacity(room.clone()).message(), "room is full");
        assert_eq!(RoomError::RoomNotFound(room.clone()).message(), "room not found");
        assert_eq!(RoomError::Auth(room.clone()).message(), "Invalid password");
        assert_eq!(
            RoomError::NotMember {
                user: UserId::new("eve"),
                room,
            }
            .message(),
            "user not found in room"
        );
        assert_eq!(RoomError::state("not your turn").message(), "not your turn");
    }

    #[test]
    fn test_storage_message_hides_detail() {
        let err = RoomError::from(StoreError::Timeout {
            op: "get_hash",
            limit: Duration::from_millis(100),
        });
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!err.message().contains("get_hash"));
        assert!(err.to_string().contains("get_hash"));
    }

    #[test]
    fn test_session_error_is_state_kind() {
        let err = RoomError::from(SessionError::Unregistered(ConnectionId::new(4)));
        assert_eq!(err.kind(), ErrorKind::State);
    }
}
