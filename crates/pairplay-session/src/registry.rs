//! The connection registry: which user each live connection speaks for.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is a plain `HashMap` with synchronous methods and no
//! suspension points. The room layer keeps it behind a single mutex, so
//! every mutation completes before another task can observe the map.

use std::collections::HashMap;

use pairplay_protocol::UserId;
use pairplay_transport::ConnectionId;

use crate::SessionError;

/// Maps live transport connections to logical user ids.
///
/// A user may hold several connections at once (two browser tabs, or a
/// reconnect that arrives before the old socket is noticed dead). A
/// connection maps to exactly one user; registering it again replaces the
/// previous mapping.
///
/// ## Lifecycle
///
/// ```text
/// join / create / rejoin ──→ register() ──→ lookup() ... ──→ unregister()
///                                                              (disconnect)
/// ```
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    users: HashMap<ConnectionId, UserId>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `conn` speaks for `user`.
    ///
    /// Returns the user the connection was previously registered as, if it
    /// was registered and that user differs.
    pub fn register(&mut self, conn: ConnectionId, user: UserId) -> Option<UserId> {
        let previous = self.users.insert(conn, user.clone());
        match previous {
            Some(prev) if prev != user => {
                tracing::info!(%conn, from = %prev, to = %user, "connection re-registered");
                Some(prev)
            }
            Some(_) => None,
            None => {
                tracing::debug!(%conn, %user, "connection registered");
                None
            }
        }
    }

    /// The user `conn` speaks for, if any.
    pub fn lookup(&self, conn: ConnectionId) -> Option<&UserId> {
        self.users.get(&conn)
    }

    /// Like [`lookup`](Self::lookup), but a missing entry is an error.
    ///
    /// # Errors
    /// [`SessionError::Unregistered`] if the connection has no user.
    pub fn resolve(&self, conn: ConnectionId) -> Result<&UserId, SessionError> {
        self.users.get(&conn).ok_or(SessionError::Unregistered(conn))
    }

    /// Checks that `conn` is registered as `claimed`.
    ///
    /// # Errors
    /// - [`SessionError::Unregistered`] if the connection has no user
    /// - [`SessionError::IdentityMismatch`] if it is registered as someone else
    pub fn verify(&self, conn: ConnectionId, claimed: &UserId) -> Result<(), SessionError> {
        let registered = self.resolve(conn)?;
        if registered != claimed {
            return Err(SessionError::IdentityMismatch {
                conn,
                registered: registered.clone(),
                claimed: claimed.clone(),
            });
        }
        Ok(())
    }

    /// Forgets `conn`. Returns the user it spoke for.
    pub fn unregister(&mut self, conn: ConnectionId) -> Option<UserId> {
        let removed = self.users.remove(&conn);
        if let Some(user) = &removed {
            tracing::debug!(%conn, %user, "connection unregistered");
        }
        removed
    }

    /// Every connection currently registered as `user`, in id order.
    pub fn connections_of(&self, user: &UserId) -> Vec<ConnectionId> {
        let mut conns: Vec<ConnectionId> = self
            .users
            .iter()
            .filter(|(_, u)| *u == user)
            .map(|(c, _)| *c)
            .collect();
        conns.sort();
        conns
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn user(name: &str) -> UserId {
        UserId::new(name)
    }

    // =====================================================================
    // register / lookup
    // =====================================================================

    #[test]
    fn test_register_then_lookup_returns_user() {
        let mut reg = ConnectionRegistry::new();
        assert_eq!(reg.register(conn(1), user("alice")), None);
        assert_eq!(reg.lookup(conn(1)), Some(&user("alice")));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_lookup_unknown_connection_is_none() {
        let reg = ConnectionRegistry::new();
        assert_eq!(reg.lookup(conn(7)), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_register_same_user_twice_is_idempotent() {
        let mut reg = ConnectionRegistry::new();
        reg.register(conn(1), user("alice"));
        assert_eq!(reg.register(conn(1), user("alice")), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_register_different_user_replaces_and_returns_previous() {
        let mut reg = ConnectionRegistry::new();
        reg.register(conn(1), user("alice"));
        assert_eq!(reg.register(conn(1), user("bob")), Some(user("alice")));
        assert_eq!(reg.lookup(conn(1)), Some(&user("bob")));
    }

    #[test]
    fn test_one_user_may_hold_several_connections() {
        let mut reg = ConnectionRegistry::new();
        reg.register(conn(3), user("alice"));
        reg.register(conn(1), user("alice"));
        reg.register(conn(2), user("bob"));
        assert_eq!(reg.connections_of(&user("alice")), vec![conn(1), conn(3)]);
        assert_eq!(reg.connections_of(&user("carol")), Vec::new());
    }

    // =====================================================================
    // resolve / verify
    // =====================================================================

    #[test]
    fn test_resolve_unregistered_fails() {
        let reg = ConnectionRegistry::new();
        let err = reg.resolve(conn(9)).unwrap_err();
        assert!(matches!(err, SessionError::Unregistered(c) if c == conn(9)));
    }

    #[test]
    fn test_verify_matching_user_succeeds() {
        let mut reg = ConnectionRegistry::new();
        reg.register(conn(1), user("alice"));
        assert!(reg.verify(conn(1), &user("alice")).is_ok());
    }

    #[test]
    fn test_verify_other_user_is_mismatch() {
        let mut reg = ConnectionRegistry::new();
        reg.register(conn(1), user("alice"));
        let err = reg.verify(conn(1), &user("mallory")).unwrap_err();
        match err {
            SessionError::IdentityMismatch {
                registered,
                claimed,
                ..
            } => {
                assert_eq!(registered, user("alice"));
                assert_eq!(claimed, user("mallory"));
            }
            other => panic!("expected IdentityMismatch, got {other:?}"),
        }
    }

    // =====================================================================
    // unregister
    // =====================================================================

    #[test]
    fn test_unregister_returns_user_and_forgets() {
        let mut reg = ConnectionRegistry::new();
        reg.register(conn(1), user("alice"));
        assert_eq!(reg.unregister(conn(1)), Some(user("alice")));
        assert_eq!(reg.lookup(conn(1)), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_unregister_twice_is_harmless() {
        let mut reg = ConnectionRegistry::new();
        reg.register(conn(1), user("alice"));
        reg.unregister(conn(1));
        assert_eq!(reg.unregister(conn(1)), None);
    }

    #[test]
    fn test_unregister_leaves_other_connections_of_same_user() {
        let mut reg = ConnectionRegistry::new();
        reg.register(conn(1), user("alice"));
        reg.register(conn(2), user("alice"));
        reg.unregister(conn(1));
        assert_eq!(reg.connections_of(&user("alice")), vec![conn(2)]);
    }
}
