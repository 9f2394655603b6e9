//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every room the manager handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum members per room. The matchmaking rules assume two.
    pub capacity: u8,

    /// How long room records and per-user room lists live in storage
    /// before they expire. Refreshed whenever a room is created or joined.
    pub room_ttl: Duration,

    /// How many times an admission retries its compare-and-set on
    /// `clientCount` after losing a race, before giving up with a
    /// storage error.
    pub admit_attempts: u32,

    /// Display-name prefix for rooms created by quick match.
    pub quick_match_prefix: String,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 2,
            room_ttl: Duration::from_secs(600),
            admit_attempts: 8,
            quick_match_prefix: "room".to_string(),
        }
    }
}

impl RoomConfig {
    /// Returns a copy with a different TTL.
    pub fn with_room_ttl(mut self, ttl: Duration) -> Self {
        self.room_ttl = ttl;
        self
    }

    /// Returns a copy with a different number of admission attempts.
    /// Zero is raised to one.
    pub fn with_admit_attempts(mut self, attempts: u32) -> Self {
        self.admit_attempts = attempts.max(1);
        self
    }

    /// Returns a copy with a different quick-match name prefix.
    pub fn with_quick_match_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.quick_match_prefix = prefix.into();
        self
    }
}
