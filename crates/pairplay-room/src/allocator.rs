//! Quick match: pair a user into any public room with a free seat, or open
//! a new one.
//!
//! Candidates come from storage, not from group topology: every public room
//! record whose stored count leaves a seat, in lexical key order, further
//! filtered by the live member count in the hub. The first candidate whose
//! admission succeeds wins. A candidate that fills up or vanishes between
//! the scan and the admission is skipped, not reported.
//!
//! Enumeration order is the only tie-break; there is no fairness between
//! waiting rooms.

use pairplay_protocol::{RoomId, UserId};
use pairplay_store::RoomStore;
use pairplay_transport::ConnectionId;

use crate::{Room, RoomError, RoomManager};

impl<S: RoomStore> RoomManager<S> {
    /// Quick-matches `user` on `conn`. Returns the room joined or created.
    ///
    /// # Errors
    /// - [`RoomError::Validation`] if `user` is blank
    /// - storage errors; on failure no notification is sent
    pub async fn quick_match(&self, conn: ConnectionId, user: &UserId) -> Result<Room, RoomError> {
        if user.is_empty() {
            return Err(RoomError::invalid("user missing"));
        }

        for candidate in self.repo.open_public_rooms().await? {
            if self.live_count(&candidate.room_id).await >= usize::from(self.config.capacity) {
                continue;
            }
            match self.repo.admit(&candidate.room_id, user).await {
                Ok(admission) => {
                    let room = admission.into_room();
                    self.enter(conn, user, &room).await;
                    return Ok(room);
                }
                Err(RoomError::Capacity(_) | RoomError::RoomNotFound(_)) => {
                    tracing::debug!(room_id = %candidate.room_id, %user, "candidate lost, trying next");
                }
                Err(err) => return Err(err),
            }
        }

        let mut room = Room::quick_match("", user.clone());
        room.room_name = self.quick_match_name(&room.room_id);
        self.repo.create(&room, Some(user)).await?;
        self.enter(conn, user, &room).await;
        Ok(room)
    }

    /// `<prefix>_<first 8 chars of the id>`.
    fn quick_match_name(&self, room_id: &RoomId) -> String {
        let suffix: String = room_id.as_str().chars().take(8).collect();
        format!("{}_{suffix}", self.config.quick_match_prefix)
    }
}
