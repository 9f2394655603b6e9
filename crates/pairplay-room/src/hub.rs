//! The broadcast hub: live connections and the room groups they sit in.
//!
//! The hub is the in-process side of a room. Storage says who is a member
//! of a room; the hub says which live connections are listening to it
//! right now. Group names are [`RoomId::group`] values, so each room has
//! exactly one group and no connection has a group of its own.
//!
//! Sends are fire-and-forget into unbounded channels, one per connection,
//! drained by that connection's writer task.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use pairplay_protocol::{RoomId, ServerEvent};
use pairplay_transport::ConnectionId;
use tokio::sync::mpsc;

/// Channel sender for delivering events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Live connections and room groups.
#[derive(Debug, Default)]
pub struct Hub {
    senders: HashMap<ConnectionId, EventSender>,
    groups: BTreeMap<String, BTreeSet<ConnectionId>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live connection's outbound channel.
    pub fn connect(&mut self, conn: ConnectionId, sender: EventSender) {
        self.senders.insert(conn, sender);
    }

    /// Returns `true` if the connection is live.
    pub fn is_connected(&self, conn: ConnectionId) -> bool {
        self.senders.contains_key(&conn)
    }

    /// Adds the connection to the room's group. Returns the live member
    /// count afterwards. Joining twice is a no-op.
    pub fn join(&mut self, conn: ConnectionId, room: &RoomId) -> usize {
        let members = self.groups.entry(room.group().to_owned()).or_default();
        members.insert(conn);
        members.len()
    }

    /// Removes the connection from the room's group. Returns the live
    /// member count afterwards. Empty groups are dropped.
    pub fn leave(&mut self, conn: ConnectionId, room: &RoomId) -> usize {
        let Some(members) = self.groups.get_mut(room.group()) else {
            return 0;
        };
        members.remove(&conn);
        let left = members.len();
        if left == 0 {
            self.groups.remove(room.group());
        }
        left
    }

    /// Drops the room's group entirely, returning its former members.
    pub fn dissolve(&mut self, room: &RoomId) -> Vec<ConnectionId> {
        self.groups
            .remove(room.group())
            .map(|members| members.into_iter().collect())
            .unwrap_or_default()
    }

    /// The connections in the room's group, in id order.
    pub fn members(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.groups
            .get(room.group())
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of live connections in the room's group.
    pub fn member_count(&self, room: &RoomId) -> usize {
        self.groups.get(room.group()).map_or(0, BTreeSet::len)
    }

    /// Returns `true` if the connection is in the room's group.
    pub fn is_member(&self, conn: ConnectionId, room: &RoomId) -> bool {
        self.groups.get(room.group()).is_some_and(|m| m.contains(&conn))
    }

    /// Every room whose group holds the connection.
    pub fn rooms_of(&self, conn: ConnectionId) -> Vec<RoomId> {
        self.groups
            .iter()
            .filter(|(_, members)| members.contains(&conn))
            .map(|(group, _)| RoomId::new(group.as_str()))
            .collect()
    }

    /// Sends an event to one connection. Returns `false` if it is gone.
    pub fn emit_to(&self, conn: ConnectionId, event: ServerEvent) -> bool {
        match self.senders.get(&conn) {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Sends an event to every member of the room. Returns how many
    /// connections it was queued for.
    pub fn broadcast(&self, room: &RoomId, event: &ServerEvent) -> usize {
        let Some(members) = self.groups.get(room.group()) else {
            return 0;
        };
        members
            .iter()
            .filter(|conn| self.emit_to(**conn, event.clone()))
            .count()
    }

    /// Forgets the connection: its outbound channel and every group
    /// membership. Returns the rooms it was in.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<RoomId> {
        self.senders.remove(&conn);
        let rooms = self.rooms_of(conn);
        for room in &rooms {
            self.leave(conn, room);
        }
        rooms
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn connected(hub: &mut Hub, n: u64) -> UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        hub.connect(conn(n), tx);
        rx
    }

    fn ping() -> ServerEvent {
        ServerEvent::PlayerLeft {
            message: "x".into(),
        }
    }

    #[test]
    fn test_join_counts_distinct_members() {
        let mut hub = Hub::new();
        let room = RoomId::new("r1");
        assert_eq!(hub.join(conn(1), &room), 1);
        assert_eq!(hub.join(conn(1), &room), 1);
        assert_eq!(hub.join(conn(2), &room), 2);
        assert_eq!(hub.members(&room), vec![conn(1), conn(2)]);
    }

    #[test]
    fn test_leave_drops_empty_group() {
        let mut hub = Hub::new();
        let room = RoomId::new("r1");
        hub.join(conn(1), &room);
        assert_eq!(hub.leave(conn(1), &room), 0);
        assert!(hub.rooms_of(conn(1)).is_empty());
        assert_eq!(hub.leave(conn(1), &room), 0);
    }

    #[test]
    fn test_broadcast_counts_only_live_receivers() {
        let mut hub = Hub::new();
        let _rx1 = connected(&mut hub, 1);
        let rx2 = connected(&mut hub, 2);
        drop(rx2);
        let room = RoomId::new("r1");
        hub.join(conn(1), &room);
        hub.join(conn(2), &room);
        hub.join(conn(3), &room);

        assert_eq!(hub.broadcast(&room, &ping()), 1);
    }

    #[test]
    fn test_disconnect_leaves_every_group() {
        let mut hub = Hub::new();
        let _rx = connected(&mut hub, 1);
        let a = RoomId::new("a");
        let b = RoomId::new("b");
        hub.join(conn(1), &a);
        hub.join(conn(1), &b);
        hub.join(conn(2), &b);

        let rooms = hub.disconnect(conn(1));
        assert_eq!(rooms, vec![a.clone(), b.clone()]);
        assert!(!hub.is_connected(conn(1)));
        assert_eq!(hub.member_count(&a), 0);
        assert_eq!(hub.members(&b), vec![conn(2)]);
    }

    #[test]
    fn test_dissolve_returns_former_members() {
        let mut hub = Hub::new();
        let room = RoomId::new("r1");
        hub.join(conn(2), &room);
        hub.join(conn(1), &room);
        assert_eq!(hub.dissolve(&room), vec![conn(1), conn(2)]);
        assert_eq!(hub.member_count(&room), 0);
    }

    #[test]
    fn test_groups_are_named_by_bare_room_id() {
        let mut hub = Hub::new();
        let room = RoomId::new("r1");
        hub.join(conn(1), &room);
        assert!(hub.groups.contains_key("r1"));
        assert!(!hub.groups.contains_key(room.storage_key().as_str()));
        assert_eq!(hub.rooms_of(conn(1)), vec![room]);
    }
}
