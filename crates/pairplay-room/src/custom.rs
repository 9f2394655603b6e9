//! Custom join: enter a named, password-protected room.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. userId, room id and password present → else `invalid data`
//! 2. live member count below capacity      → else `room is full`
//! 3. room record exists                    → else `room not found`
//! 4. password matches exactly              → else `Invalid password`
//! 5. user already a member                 → rejoin, nothing written
//! 6. otherwise                             → capacity-checked admission
//!
//! Because existence is checked before the password, the two error
//! messages reveal whether a room id exists. Acceptable for a game lobby;
//! do not reuse this ordering where room ids are secrets.

use pairplay_protocol::CustomJoinRequest;
use pairplay_store::RoomStore;
use pairplay_transport::ConnectionId;

use crate::{Room, RoomError, RoomManager};

impl<S: RoomStore> RoomManager<S> {
    /// Joins `conn` into the custom room named by `request`.
    ///
    /// Returns the room as it stands after the join.
    pub async fn join_custom_room(
        &self,
        conn: ConnectionId,
        request: &CustomJoinRequest,
    ) -> Result<Room, RoomError> {
        let CustomJoinRequest {
            user_id,
            room_id,
            password,
            ..
        } = request;

        if user_id.is_empty() || room_id.is_empty() || password.is_empty() {
            return Err(RoomError::invalid("userId, id and password are required"));
        }
        if self.live_count(room_id).await >= usize::from(self.config.capacity) {
            return Err(RoomError::Capacity(room_id.clone()));
        }
        let room = self.repo.require(room_id).await?;
        if room.password != *password {
            tracing::debug!(%room_id, %user_id, "custom join with wrong password");
            return Err(RoomError::Auth(room_id.clone()));
        }

        let room = if room.is_member(user_id) {
            tracing::debug!(%room_id, %user_id, "member re-entering custom room");
            room
        } else {
            self.repo.admit(room_id, user_id).await?.into_room()
        };
        self.enter(conn, user_id, &room).await;
        Ok(room)
    }
}
