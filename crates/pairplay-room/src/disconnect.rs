//! Disconnect cleanup and voluntary leave.
//!
//! Leaving a room, voluntarily or by losing the connection, ends it: the
//! remaining members get one `player_left` each, the group is dissolved,
//! any running match is dropped, and the room record is deleted
//! unconditionally. There is no grace period at the storage layer.
//!
//! The transport reports connection loss in two steps, and cleanup is
//! split the same way:
//!
//! - [`disconnecting`](RoomManager::disconnecting) runs while group
//!   membership is still inspectable and ends every room the connection
//!   was in.
//! - [`disconnected`](RoomManager::disconnected) forgets the connection
//!   itself: its outbound channel and its identity mapping.

use pairplay_protocol::{RoomId, ServerEvent};
use pairplay_store::RoomStore;
use pairplay_transport::ConnectionId;

use crate::manager::PLAYER_LEFT_MESSAGE;
use crate::{RoomError, RoomManager};

impl<S: RoomStore> RoomManager<S> {
    /// Ends every room `conn` is in. Storage failures are logged, not
    /// returned: the connection is going away regardless.
    pub async fn disconnecting(&self, conn: ConnectionId) {
        let rooms = self.rooms_of(conn).await;
        for room_id in rooms {
            if let Err(err) = self.end_room(conn, &room_id).await {
                tracing::warn!(%conn, %room_id, error = %err, "room delete failed during disconnect");
            }
        }
    }

    /// Forgets `conn` entirely.
    pub async fn disconnected(&self, conn: ConnectionId) {
        let leftover = self.hub.lock().await.disconnect(conn);
        let user = self.registry.lock().await.unregister(conn);
        tracing::info!(
            %conn,
            user = user.as_ref().map(|u| u.as_str()).unwrap_or("-"),
            leftover_rooms = leftover.len(),
            "connection closed"
        );
    }

    /// Voluntarily leaves a room, ending it for everyone.
    ///
    /// # Errors
    /// - [`RoomError::Validation`] if the room id is blank
    /// - [`RoomError::State`] if `conn` is not in the room
    /// - storage errors from the delete
    pub async fn leave_room(&self, conn: ConnectionId, room_id: &RoomId) -> Result<(), RoomError> {
        if room_id.is_empty() {
            return Err(RoomError::invalid("roomId missing"));
        }
        if !self.hub.lock().await.is_member(conn, room_id) {
            return Err(RoomError::state("not in this room"));
        }
        self.end_room(conn, room_id).await
    }

    /// Takes `conn` out of the room, tells whoever is left, and deletes
    /// the room.
    async fn end_room(&self, conn: ConnectionId, room_id: &RoomId) -> Result<(), RoomError> {
        let notified = {
            let mut hub = self.hub.lock().await;
            hub.leave(conn, room_id);
            let notified = hub.broadcast(
                room_id,
                &ServerEvent::PlayerLeft {
                    message: PLAYER_LEFT_MESSAGE.to_string(),
                },
            );
            hub.dissolve(room_id);
            notified
        };
        self.matches.lock().await.remove(room_id);
        tracing::info!(%conn, %room_id, notified, "player left room");

        self.repo.delete(room_id).await?;
        Ok(())
    }
}
