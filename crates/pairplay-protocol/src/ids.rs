//! Identity types shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// A logical user identity, as supplied by the client.
///
/// This is NOT tied to a connection: the same user may come back on a new
/// connection and rejoin the rooms it belongs to. The connection → user
/// association lives in the session registry, never in storage.
///
/// `#[serde(transparent)]` keeps it a plain JSON string on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a raw user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for blank identifiers (missing from the payload,
    /// or only whitespace).
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// Prefix of the storage key that holds a room record.
const ROOM_KEY_PREFIX: &str = "room:";

/// The canonical identifier of a room.
///
/// A room id has two derived representations, and this type is the only
/// place either is produced:
///
/// | Representation | Form          | Used by                      |
/// |----------------|---------------|------------------------------|
/// | storage key    | `room:<id>`   | the room record in the store |
/// | group name     | `<id>`        | the broadcast group in the hub |
///
/// Everything else passes `RoomId` around and converts at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Generates a fresh, unique room id (UUID v4, simple form).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Wraps an existing room id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the bare id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id is blank.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The key of the room record in storage: `room:<id>`.
    pub fn storage_key(&self) -> String {
        format!("{ROOM_KEY_PREFIX}{}", self.0)
    }

    /// The name of the room's broadcast group: the bare id.
    pub fn group(&self) -> &str {
        &self.0
    }

    /// Parses a `room:<id>` storage key back into a `RoomId`.
    ///
    /// Returns `None` for keys of any other shape.
    pub fn from_storage_key(key: &str) -> Option<Self> {
        key.strip_prefix(ROOM_KEY_PREFIX)
            .filter(|id| !id.is_empty())
            .map(Self::new)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomType
// ---------------------------------------------------------------------------

/// Whether a room takes part in quick match.
///
/// Quick-match rooms are `Public`; rooms created by a user with a password
/// are `Private` and only reachable through a custom join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Public,
    Private,
}

impl RoomType {
    /// The stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    /// Parses the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
