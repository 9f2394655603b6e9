//! Rejoin: restore a returning user's membership on a new connection.
//!
//! Only existing membership is restored. There is no password and no
//! capacity check, and nothing is written to storage.

use pairplay_protocol::RejoinRequest;
use pairplay_store::RoomStore;
use pairplay_transport::ConnectionId;

use crate::{Room, RoomError, RoomManager};

impl<S: RoomStore> RoomManager<S> {
    /// Re-adds `conn` to the room if the user is a recorded member.
    ///
    /// # Errors
    /// - [`RoomError::Validation`] if userId or roomId is blank
    /// - [`RoomError::RoomNotFound`] if the room is gone
    /// - [`RoomError::NotMember`] if the user never joined it
    pub async fn rejoin(&self, conn: ConnectionId, request: &RejoinRequest) -> Result<Room, RoomError> {
        let RejoinRequest { user_id, room_id } = request;
        if user_id.is_empty() || room_id.is_empty() {
            return Err(RoomError::invalid("userId and roomId are required"));
        }

        let room = self.repo.require(room_id).await?;
        if !room.is_member(user_id) {
            return Err(RoomError::NotMember {
                user: user_id.clone(),
                room: room_id.clone(),
            });
        }
        self.enter(conn, user_id, &room).await;
        tracing::info!(%conn, %user_id, %room_id, "user rejoined");
        Ok(room)
    }
}
