//! The room manager: entry point for every room operation.
//!
//! `RoomManager` owns the four pieces of room state:
//!
//! - the [`RoomRepository`] (shared, in storage)
//! - the [`Hub`] (live connections and groups, in process)
//! - the [`ConnectionRegistry`] (connection → user, in process)
//! - the match table (running games, in process)
//!
//! The operations themselves live in sibling modules, one `impl` block per
//! component: quick match in `allocator`, custom rooms in `custom`, rejoin
//! in `rejoin`, disconnect cleanup in `disconnect`, the game relay in
//! `relay`.
//!
//! # Locking
//!
//! Each in-process piece sits behind its own async mutex. No lock is held
//! across a storage call, and when two are taken together the order is
//! hub, then registry, then matches.

use std::collections::HashMap;

use pairplay_protocol::{RoomId, ServerEvent, UserId};
use pairplay_session::ConnectionRegistry;
use pairplay_store::RoomStore;
use pairplay_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::relay::Match;
use crate::{EventSender, Hub, Room, RoomConfig, RoomError, RoomRepository};

/// Message sent to the members left behind when someone leaves.
pub(crate) const PLAYER_LEFT_MESSAGE: &str = "the other player left the room";

/// Message broadcast when a room reaches capacity.
pub(crate) const MATCH_FOUND_MESSAGE: &str = "match found, game can start";

/// Manages rooms, live connections and running matches.
pub struct RoomManager<S: RoomStore> {
    pub(crate) repo: RoomRepository<S>,
    pub(crate) hub: Mutex<Hub>,
    pub(crate) registry: Mutex<ConnectionRegistry>,
    pub(crate) matches: Mutex<HashMap<RoomId, Match>>,
    pub(crate) config: RoomConfig,
}

impl<S: RoomStore> RoomManager<S> {
    /// Creates a manager over `store`.
    pub fn new(store: S, config: RoomConfig) -> Self {
        Self {
            repo: RoomRepository::new(store, config.clone()),
            hub: Mutex::new(Hub::new()),
            registry: Mutex::new(ConnectionRegistry::new()),
            matches: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// The room configuration.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// The typed repository over the store.
    pub fn repository(&self) -> &RoomRepository<S> {
        &self.repo
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Registers a new live connection and its outbound channel.
    pub async fn connect(&self, conn: ConnectionId, sender: EventSender) {
        self.hub.lock().await.connect(conn, sender);
        tracing::debug!(%conn, "connection attached");
    }

    /// Records that `conn` speaks for `user`.
    pub async fn identify(&self, conn: ConnectionId, user: UserId) {
        self.registry.lock().await.register(conn, user);
    }

    /// The user `conn` speaks for, if it has joined, created or rejoined a room.
    pub async fn user_of(&self, conn: ConnectionId) -> Option<UserId> {
        self.registry.lock().await.lookup(conn).cloned()
    }

    /// Sends an event to one connection.
    pub async fn emit_to(&self, conn: ConnectionId, event: ServerEvent) -> bool {
        self.hub.lock().await.emit_to(conn, event)
    }

    /// Number of live connections in the room's group.
    pub async fn live_count(&self, room_id: &RoomId) -> usize {
        self.hub.lock().await.member_count(room_id)
    }

    /// Every room whose group holds the connection.
    pub async fn rooms_of(&self, conn: ConnectionId) -> Vec<RoomId> {
        self.hub.lock().await.rooms_of(conn)
    }

    // -----------------------------------------------------------------------
    // Room CRUD
    // -----------------------------------------------------------------------

    /// Creates an empty private room and adds it to the creator's room list.
    ///
    /// # Errors
    /// [`RoomError::Validation`] if any argument is blank.
    pub async fn create_custom_room(
        &self,
        user: &UserId,
        room_name: &str,
        password: &str,
    ) -> Result<Room, RoomError> {
        if user.is_empty() {
            return Err(RoomError::invalid("userId missing"));
        }
        if room_name.trim().is_empty() {
            return Err(RoomError::invalid("roomName missing"));
        }
        if password.is_empty() {
            return Err(RoomError::invalid("password missing"));
        }
        let room = Room::custom(room_name, password);
        self.repo.create(&room, Some(user)).await?;
        Ok(room)
    }

    /// Reads a room.
    ///
    /// # Errors
    /// [`RoomError::RoomNotFound`] if it does not exist or has expired.
    pub async fn get_room(&self, room_id: &RoomId) -> Result<Room, RoomError> {
        self.repo.require(room_id).await
    }

    /// The rooms the user created or joined that still exist.
    pub async fn rooms_for_user(&self, user: &UserId) -> Result<Vec<Room>, RoomError> {
        if user.is_empty() {
            return Err(RoomError::invalid("userId missing"));
        }
        self.repo.rooms_for_user(user).await
    }

    /// Every live room.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, RoomError> {
        self.repo.list_rooms().await
    }

    // -----------------------------------------------------------------------
    // Shared join step
    // -----------------------------------------------------------------------

    /// Puts a connection into a room whose membership storage has already
    /// confirmed, then notifies.
    ///
    /// The joiner gets `emit_joined_into_room`; every member gets
    /// `number_of_clients`; if the room is now at capacity every member
    /// also gets `match_found`. Returns the live member count.
    pub(crate) async fn enter(&self, conn: ConnectionId, user: &UserId, room: &Room) -> usize {
        let mut hub = self.hub.lock().await;
        let count = hub.join(conn, &room.room_id);
        self.registry.lock().await.register(conn, user.clone());

        hub.emit_to(
            conn,
            ServerEvent::EmitJoinedIntoRoom {
                room_id: room.room_id.clone(),
                room_name: room.room_name.clone(),
            },
        );
        hub.broadcast(
            &room.room_id,
            &ServerEvent::NumberOfClients {
                room_id: room.room_id.clone(),
                room_name: room.room_name.clone(),
                count,
            },
        );
        if count >= usize::from(self.config.capacity) {
            hub.broadcast(
                &room.room_id,
                &ServerEvent::MatchFound {
                    room_id: room.room_id.clone(),
                    room_name: room.room_name.clone(),
                    message: MATCH_FOUND_MESSAGE.to_string(),
                },
            );
            tracing::info!(room_id = %room.room_id, "match found");
        }
        tracing::info!(%conn, %user, room_id = %room.room_id, count, "joined room");
        count
    }
}
