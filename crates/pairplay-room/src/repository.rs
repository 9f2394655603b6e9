//! Typed access to room records, per-user room lists, and scores.
//!
//! Every method is one or more storage round-trips. The only
//! read-modify-write on shared state, admission, goes through
//! `compare_and_swap_hash` on `clientCount`, so two joins racing for the
//! last seat cannot both succeed.

use std::collections::HashSet;

use pairplay_protocol::{RoomId, RoomType, UserId};
use pairplay_store::{Fields, RoomStore};

use crate::record::{FIELD_ACTIVE_USERS, FIELD_CLIENT_COUNT, encode_users};
use crate::{Room, RoomConfig, RoomError};

const USER_ROOMS_PREFIX: &str = "rooms:";
const SCORE_PREFIX: &str = "score:";
const FIELD_POINTS: &str = "points";

/// The outcome of a successful admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The user took a free seat; `clientCount` and `activeUsers` grew.
    Admitted(Room),
    /// The user was already a member; nothing was written.
    AlreadyMember(Room),
}

impl Admission {
    /// The room as it stands after the admission.
    pub fn room(&self) -> &Room {
        match self {
            Self::Admitted(room) | Self::AlreadyMember(room) => room,
        }
    }

    /// Consumes the admission, returning the room.
    pub fn into_room(self) -> Room {
        match self {
            Self::Admitted(room) | Self::AlreadyMember(room) => room,
        }
    }
}

/// Room persistence over any [`RoomStore`].
pub struct RoomRepository<S> {
    store: S,
    config: RoomConfig,
}

impl<S: RoomStore> RoomRepository<S> {
    pub fn new(store: S, config: RoomConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes a new room record with the configured TTL and, if an owner is
    /// given, adds it to the owner's room list.
    ///
    /// A record that cannot be given a TTL is deleted again before the
    /// error is returned, so no room outlives a failed create. The owner's
    /// room list is best-effort once the record stands.
    pub async fn create(&self, room: &Room, owner: Option<&UserId>) -> Result<(), RoomError> {
        let key = room.room_id.storage_key();
        self.store.set_hash(&key, room.to_fields()?).await?;
        if let Err(err) = self.store.set_expire(&key, self.config.room_ttl).await {
            if let Err(cleanup) = self.store.delete_key(&key).await {
                tracing::warn!(room_id = %room.room_id, error = %cleanup, "orphaned room record left behind");
            }
            return Err(err.into());
        }
        if let Some(user) = owner {
            self.index_best_effort(user, &room.room_id).await;
        }
        tracing::info!(
            room_id = %room.room_id,
            room_name = %room.room_name,
            room_type = %room.room_type,
            "room created"
        );
        Ok(())
    }

    /// Reads a room record. `Ok(None)` if absent or expired.
    pub async fn get(&self, room_id: &RoomId) -> Result<Option<Room>, RoomError> {
        let fields = self.store.get_hash(&room_id.storage_key()).await?;
        Room::from_fields(room_id, &fields)
    }

    /// Like [`get`](Self::get), but an absent room is [`RoomError::RoomNotFound`].
    pub async fn require(&self, room_id: &RoomId) -> Result<Room, RoomError> {
        self.get(room_id)
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))
    }

    /// Adds `user` to the room, or confirms they are already a member.
    ///
    /// A new member increments `clientCount` and is appended to
    /// `activeUsers` in one compare-and-set keyed on the count that was
    /// read. Losing the race re-reads and retries, up to
    /// `admit_attempts` times. Once the swap lands the admission stands;
    /// refreshing the TTL and the user's room list after it are
    /// best-effort.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`] if the room is absent (or vanished mid-retry)
    /// - [`RoomError::Capacity`] if the room is full
    /// - [`RoomError::Unconfirmed`] if every attempt lost its race
    pub async fn admit(&self, room_id: &RoomId, user: &UserId) -> Result<Admission, RoomError> {
        let key = room_id.storage_key();
        for attempt in 1..=self.config.admit_attempts {
            let mut room = self.require(room_id).await?;
            if room.is_member(user) {
                return Ok(Admission::AlreadyMember(room));
            }
            if room.client_count >= self.config.capacity {
                return Err(RoomError::Capacity(room_id.clone()));
            }

            let expected = room.client_count.to_string();
            room.client_count += 1;
            room.active_users.push(user.clone());

            let mut update = Fields::new();
            update.insert(FIELD_CLIENT_COUNT.into(), room.client_count.to_string());
            update.insert(FIELD_ACTIVE_USERS.into(), encode_users(&room.active_users, room_id)?);

            if self
                .store
                .compare_and_swap_hash(&key, FIELD_CLIENT_COUNT, &expected, update)
                .await?
            {
                if let Err(err) = self.store.set_expire(&key, self.config.room_ttl).await {
                    tracing::warn!(%room_id, error = %err, "room TTL not refreshed after admission");
                }
                self.index_best_effort(user, room_id).await;
                tracing::info!(
                    %room_id,
                    %user,
                    client_count = room.client_count,
                    "user admitted"
                );
                return Ok(Admission::Admitted(room));
            }
            tracing::debug!(%room_id, %user, attempt, "admission lost a race, retrying");
        }
        Err(RoomError::Unconfirmed(key))
    }

    /// Deletes a room record. Returns `false` if it was already gone.
    pub async fn delete(&self, room_id: &RoomId) -> Result<bool, RoomError> {
        let removed = self.store.delete_key(&room_id.storage_key()).await?;
        if removed {
            tracing::info!(%room_id, "room deleted");
        }
        Ok(removed)
    }

    /// Appends the room to the user's room list and refreshes its TTL.
    pub async fn index_for_user(&self, user: &UserId, room_id: &RoomId) -> Result<(), RoomError> {
        let key = user_rooms_key(user);
        self.store.list_push(&key, &room_id.storage_key()).await?;
        self.store.set_expire(&key, self.config.room_ttl).await?;
        Ok(())
    }

    /// [`index_for_user`](Self::index_for_user) after a confirmed write:
    /// failure is logged, not returned.
    async fn index_best_effort(&self, user: &UserId, room_id: &RoomId) {
        if let Err(err) = self.index_for_user(user, room_id).await {
            tracing::warn!(%user, %room_id, error = %err, "user room list not updated");
        }
    }

    /// Reads a room for a listing. A record that does not parse as a room
    /// is logged and skipped rather than failing the whole listing.
    async fn get_listed(&self, room_id: &RoomId) -> Result<Option<Room>, RoomError> {
        match self.get(room_id).await {
            Err(RoomError::Corrupt { key, reason }) => {
                tracing::warn!(%key, %reason, "skipping unreadable room record");
                Ok(None)
            }
            other => other,
        }
    }

    /// The rooms in the user's room list that still exist, oldest first,
    /// each listed once.
    pub async fn rooms_for_user(&self, user: &UserId) -> Result<Vec<Room>, RoomError> {
        let keys = self.store.list_range(&user_rooms_key(user), 0, -1).await?;
        let mut seen = HashSet::new();
        let mut rooms = Vec::new();
        for key in keys {
            let Some(room_id) = RoomId::from_storage_key(&key) else {
                continue;
            };
            if !seen.insert(room_id.clone()) {
                continue;
            }
            if let Some(room) = self.get_listed(&room_id).await? {
                rooms.push(room);
            }
        }
        Ok(rooms)
    }

    /// Every live room, in lexical order of storage key.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, RoomError> {
        let keys = self.store.list_keys("room:*").await?;
        let mut rooms = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(room_id) = RoomId::from_storage_key(&key) else {
                continue;
            };
            if let Some(room) = self.get_listed(&room_id).await? {
                rooms.push(room);
            }
        }
        Ok(rooms)
    }

    /// Public rooms whose stored count leaves a free seat, in lexical order.
    pub async fn open_public_rooms(&self) -> Result<Vec<Room>, RoomError> {
        Ok(self
            .list_rooms()
            .await?
            .into_iter()
            .filter(|room| {
                room.room_type == RoomType::Public
                    && room.client_count < self.config.capacity
            })
            .collect())
    }

    /// The user's running score; zero if none is stored.
    pub async fn score(&self, user: &UserId) -> Result<u64, RoomError> {
        let fields = self.store.get_hash(&score_key(user)).await?;
        parse_points(user, &fields)
    }

    /// Adds `points` to the user's score and returns the new total.
    pub async fn add_score(&self, user: &UserId, points: u64) -> Result<u64, RoomError> {
        let key = score_key(user);
        for _ in 0..self.config.admit_attempts {
            let fields = self.store.get_hash(&key).await?;
            let current = parse_points(user, &fields)?;
            let expected = fields.get(FIELD_POINTS).cloned().unwrap_or_default();
            let total = current + points;

            let mut update = Fields::new();
            update.insert(FIELD_POINTS.into(), total.to_string());
            if self
                .store
                .compare_and_swap_hash(&key, FIELD_POINTS, &expected, update)
                .await?
            {
                tracing::debug!(%user, points, total, "score updated");
                return Ok(total);
            }
        }
        Err(RoomError::Unconfirmed(key))
    }
}

fn user_rooms_key(user: &UserId) -> String {
    format!("{USER_ROOMS_PREFIX}{user}")
}

fn score_key(user: &UserId) -> String {
    format!("{SCORE_PREFIX}{user}")
}

fn parse_points(user: &UserId, fields: &Fields) -> Result<u64, RoomError> {
    match fields.get(FIELD_POINTS) {
        None => Ok(0),
        Some(raw) => raw.parse().map_err(|_| RoomError::Corrupt {
            key: score_key(user),
            reason: "bad points".to_string(),
        }),
    }
}
