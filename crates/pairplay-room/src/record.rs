//! The room record and its stored hash form.
//!
//! A room is stored as one hash under `room:<id>`:
//!
//! | Field         | Value                                  |
//! |---------------|----------------------------------------|
//! | `roomId`      | bare id                                |
//! | `roomName`    | display name                           |
//! | `type`        | `public` or `private`                  |
//! | `password`    | secret, empty for quick-match rooms    |
//! | `activeUsers` | JSON array of user ids, in join order  |
//! | `clientCount` | decimal member count                   |

use pairplay_protocol::{RoomId, RoomSummary, RoomType, UserId};
use pairplay_store::Fields;

use crate::RoomError;

pub(crate) const FIELD_ROOM_ID: &str = "roomId";
pub(crate) const FIELD_ROOM_NAME: &str = "roomName";
pub(crate) const FIELD_TYPE: &str = "type";
pub(crate) const FIELD_PASSWORD: &str = "password";
pub(crate) const FIELD_ACTIVE_USERS: &str = "activeUsers";
pub(crate) const FIELD_CLIENT_COUNT: &str = "clientCount";

/// One match: who is in it, and how to get in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub room_id: RoomId,
    pub room_name: String,
    pub room_type: RoomType,
    pub password: String,
    /// Users counted as members, in join order. Not necessarily connected.
    pub active_users: Vec<UserId>,
    pub client_count: u8,
}

impl Room {
    /// A public quick-match room with `user` as its only member.
    pub fn quick_match(room_name: impl Into<String>, user: UserId) -> Self {
        Self {
            room_id: RoomId::generate(),
            room_name: room_name.into(),
            room_type: RoomType::Public,
            password: String::new(),
            active_users: vec![user],
            client_count: 1,
        }
    }

    /// An empty, password-protected private room.
    pub fn custom(room_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            room_id: RoomId::generate(),
            room_name: room_name.into(),
            room_type: RoomType::Private,
            password: password.into(),
            active_users: Vec::new(),
            client_count: 0,
        }
    }

    /// Returns `true` if `user` is already counted as a member.
    pub fn is_member(&self, user: &UserId) -> bool {
        self.active_users.contains(user)
    }

    /// The listing view of this room, without the password.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.room_id.clone(),
            room_name: self.room_name.clone(),
            room_type: self.room_type,
            client_count: self.client_count,
        }
    }

    pub(crate) fn to_fields(&self) -> Result<Fields, RoomError> {
        let mut fields = Fields::new();
        fields.insert(FIELD_ROOM_ID.into(), self.room_id.as_str().into());
        fields.insert(FIELD_ROOM_NAME.into(), self.room_name.clone());
        fields.insert(FIELD_TYPE.into(), self.room_type.as_str().into());
        fields.insert(FIELD_PASSWORD.into(), self.password.clone());
        fields.insert(FIELD_ACTIVE_USERS.into(), encode_users(&self.active_users, &self.room_id)?);
        fields.insert(FIELD_CLIENT_COUNT.into(), self.client_count.to_string());
        Ok(fields)
    }

    /// Parses a stored hash. An empty hash (missing key) is `Ok(None)`.
    pub(crate) fn from_fields(room_id: &RoomId, fields: &Fields) -> Result<Option<Self>, RoomError> {
        if fields.is_empty() {
            return Ok(None);
        }
        let corrupt = |reason: &str| RoomError::Corrupt {
            key: room_id.storage_key(),
            reason: reason.to_string(),
        };

        let room_type = fields
            .get(FIELD_TYPE)
            .and_then(|t| RoomType::parse(t))
            .ok_or_else(|| corrupt("bad type"))?;
        let client_count = fields
            .get(FIELD_CLIENT_COUNT)
            .map_or(Ok(0), |c| c.parse::<u8>())
            .map_err(|_| corrupt("bad clientCount"))?;
        let active_users = match fields.get(FIELD_ACTIVE_USERS) {
            Some(raw) if !raw.is_empty() => {
                serde_json::from_str(raw).map_err(|_| corrupt("bad activeUsers"))?
            }
            _ => Vec::new(),
        };

        Ok(Some(Self {
            room_id: room_id.clone(),
            room_name: fields.get(FIELD_ROOM_NAME).cloned().unwrap_or_default(),
            room_type,
            password: fields.get(FIELD_PASSWORD).cloned().unwrap_or_default(),
            active_users,
            client_count,
        }))
    }
}

pub(crate) fn encode_users(users: &[UserId], room_id: &RoomId) -> Result<String, RoomError> {
    serde_json::to_string(users).map_err(|e| RoomError::Corrupt {
        key: room_id.storage_key(),
        reason: e.to_string(),
    })
}
