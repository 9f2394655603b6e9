//! The game relay: start, moves, result, and chat.
//!
//! The server does not know the game's rules. It only enforces who may act:
//!
//! - a match starts once two distinct users are live in the room; symbols
//!   are dealt once at random and X moves first
//! - a move is accepted only from the connection registered as the
//!   declared mover, and only when that mover holds the turn; the turn
//!   then passes to the other player
//! - a result is accepted once per match; the winner scores 5 points, a
//!   draw scores 1 for each player
//!
//! Every accepted action is broadcast to the whole room. A rejected one is
//! reported only to the sender, and nothing is broadcast.

use pairplay_protocol::{
    ChatRequest, GameOverRequest, GameResult, GameSnapshot, MoveRequest, PlayGameRequest,
    PlayerSlot, RoomId, ScoreEntry, ServerEvent, Symbol, UserId,
};
use pairplay_store::RoomStore;
use pairplay_transport::ConnectionId;
use rand::Rng;
use serde_json::Value;

use crate::{RoomError, RoomManager};

const WIN_POINTS: u64 = 5;
const DRAW_POINTS: u64 = 1;

/// A running or finished match in one room.
#[derive(Debug, Clone)]
pub(crate) struct Match {
    players: [PlayerSlot; 2],
    turn: UserId,
    moves: u32,
    data: Value,
    finished: bool,
}

impl Match {
    /// Deals symbols between `a` and `b`. `a_is_x` decides who gets X.
    fn new(a: UserId, b: UserId, a_is_x: bool) -> Self {
        let (x, o) = if a_is_x { (a, b) } else { (b, a) };
        Self {
            turn: x.clone(),
            players: [
                PlayerSlot {
                    user_id: x,
                    symbol: Symbol::X,
                },
                PlayerSlot {
                    user_id: o,
                    symbol: Symbol::O,
                },
            ],
            moves: 0,
            data: Value::Null,
            finished: false,
        }
    }

    fn snapshot(&self, room_id: &RoomId) -> GameSnapshot {
        GameSnapshot {
            room_id: room_id.clone(),
            players: self.players.to_vec(),
            turn: self.turn.clone(),
            moves: self.moves,
            data: self.data.clone(),
        }
    }

    fn is_player(&self, user: &UserId) -> bool {
        self.players.iter().any(|p| p.user_id == *user)
    }

    /// `true` if `a` and `b` are this match's two players, in either order.
    fn has_players(&self, a: &UserId, b: &UserId) -> bool {
        let [p, q] = &self.players;
        (p.user_id == *a && q.user_id == *b) || (p.user_id == *b && q.user_id == *a)
    }

    fn opponent_of(&self, user: &UserId) -> UserId {
        let [p, q] = &self.players;
        if p.user_id == *user {
            q.user_id.clone()
        } else {
            p.user_id.clone()
        }
    }
}

fn deal_x_to_first() -> bool {
    rand::rng().random_bool(0.5)
}

impl<S: RoomStore> RoomManager<S> {
    /// Starts the match in a full room, or re-sends the running one.
    ///
    /// Broadcasts `game_started` and returns the snapshot.
    ///
    /// # Errors
    /// - [`RoomError::State`] if `conn` is not in the room or fewer than two
    ///   distinct users can be resolved among its live members
    /// - [`RoomError::Identity`] if `userId` is given and is not who `conn`
    ///   is registered as
    pub async fn start_game(
        &self,
        conn: ConnectionId,
        request: &PlayGameRequest,
    ) -> Result<GameSnapshot, RoomError> {
        let room_id = &request.room_id;
        if room_id.is_empty() {
            return Err(RoomError::invalid("roomId missing"));
        }

        let hub = self.hub.lock().await;
        if !hub.is_member(conn, room_id) {
            return Err(RoomError::state("not in this room"));
        }
        let mut players: Vec<UserId> = Vec::with_capacity(2);
        {
            let registry = self.registry.lock().await;
            if !request.user_id.is_empty() {
                registry.verify(conn, &request.user_id)?;
            }
            for member in hub.members(room_id) {
                if let Some(user) = registry.lookup(member) {
                    if !players.contains(user) {
                        players.push(user.clone());
                    }
                }
            }
        }
        let [a, b]: [UserId; 2] = players
            .try_into()
            .map_err(|_| RoomError::state("waiting for another player"))?;

        let mut matches = self.matches.lock().await;
        let running = matches
            .get(room_id)
            .filter(|m| !m.finished && m.has_players(&a, &b))
            .map(|m| m.snapshot(room_id));
        let snapshot = match running {
            Some(snapshot) => {
                tracing::debug!(%room_id, "match already running, re-sending state");
                snapshot
            }
            None => {
                let fresh = Match::new(a, b, deal_x_to_first());
                let snapshot = fresh.snapshot(room_id);
                matches.insert(room_id.clone(), fresh);
                tracing::info!(%room_id, first = %snapshot.turn, "match started");
                snapshot
            }
        };
        hub.broadcast(room_id, &ServerEvent::GameStarted(snapshot.clone()));
        Ok(snapshot)
    }

    /// Applies a move and passes the turn.
    ///
    /// The submitted `data` replaces the shared state wholesale. Broadcasts
    /// `game_playing` and returns the snapshot.
    ///
    /// # Errors
    /// - [`RoomError::Identity`] if `conn` is not registered as `userId`
    /// - [`RoomError::State`] if there is no running match or the mover
    ///   does not hold the turn (`not your turn`)
    pub async fn play_move(
        &self,
        conn: ConnectionId,
        request: &MoveRequest,
    ) -> Result<GameSnapshot, RoomError> {
        let MoveRequest {
            room_id,
            user_id,
            data,
        } = request;
        if room_id.is_empty() || user_id.is_empty() {
            return Err(RoomError::invalid("roomId and userId are required"));
        }

        let hub = self.hub.lock().await;
        if !hub.is_member(conn, room_id) {
            return Err(RoomError::state("not in this room"));
        }
        self.registry.lock().await.verify(conn, user_id)?;

        let mut matches = self.matches.lock().await;
        let game = matches
            .get_mut(room_id)
            .ok_or_else(|| RoomError::state("no game in progress"))?;
        if game.finished {
            return Err(RoomError::state("game is over"));
        }
        if game.turn != *user_id {
            tracing::debug!(%room_id, %user_id, turn = %game.turn, "move out of turn");
            return Err(RoomError::state("not your turn"));
        }

        game.data = data.clone();
        game.moves += 1;
        game.turn = game.opponent_of(user_id);
        let snapshot = game.snapshot(room_id);
        hub.broadcast(room_id, &ServerEvent::GamePlaying(snapshot.clone()));
        Ok(snapshot)
    }

    /// Records the result of a match and updates scores.
    ///
    /// Returns `Ok(None)` without scoring if the match was already
    /// finished. Otherwise broadcasts `game_over` with both players'
    /// running totals.
    ///
    /// # Errors
    /// - [`RoomError::Validation`] if a player is missing, or the winner is
    ///   neither player and `draw` is not set
    /// - [`RoomError::Identity`] if `conn` has no registered user
    /// - [`RoomError::State`] if no match between the two players runs in
    ///   a room `conn` is in
    /// - storage errors from the score update
    pub async fn finish_game(
        &self,
        conn: ConnectionId,
        request: &GameOverRequest,
    ) -> Result<Option<GameResult>, RoomError> {
        let GameOverRequest {
            player1,
            player2,
            winner,
            draw,
        } = request;
        if player1.is_empty() || player2.is_empty() {
            return Err(RoomError::invalid("player1 and player2 are required"));
        }
        let winner = match (draw, winner) {
            (true, None) => None,
            (false, Some(w)) if w == player1 || w == player2 => Some(w.clone()),
            _ => return Err(RoomError::invalid("winner must be a player, or draw set")),
        };

        let room_id = {
            let hub = self.hub.lock().await;
            let sender = self.registry.lock().await.resolve(conn)?.clone();
            let mut matches = self.matches.lock().await;
            let room_id = hub
                .rooms_of(conn)
                .into_iter()
                .find(|room| matches.get(room).is_some_and(|m| m.has_players(player1, player2)))
                .ok_or_else(|| RoomError::state("no game between these players"))?;
            let Some(game) = matches.get_mut(&room_id) else {
                return Err(RoomError::state("no game between these players"));
            };
            if !game.is_player(&sender) {
                return Err(RoomError::state("only players may report the result"));
            }
            if game.finished {
                tracing::debug!(%room_id, "duplicate game_over ignored");
                return Ok(None);
            }
            game.finished = true;
            room_id
        };

        let mut scores = Vec::with_capacity(2);
        for player in [player1, player2] {
            let points = match &winner {
                Some(w) if w == player => self.repo.add_score(player, WIN_POINTS).await?,
                Some(_) => self.repo.score(player).await?,
                None => self.repo.add_score(player, DRAW_POINTS).await?,
            };
            scores.push(ScoreEntry {
                user_id: player.clone(),
                points,
            });
        }

        let result = GameResult {
            room_id: room_id.clone(),
            winner,
            draw: *draw,
            scores,
        };
        self.hub
            .lock()
            .await
            .broadcast(&room_id, &ServerEvent::GameOver(result.clone()));
        tracing::info!(%room_id, draw = *draw, "match finished");
        Ok(Some(result))
    }

    /// Relays a chat line to everyone in the room, the sender included.
    ///
    /// A blank `userName` falls back to the sender's registered user id.
    /// Returns how many connections it was queued for.
    pub async fn chat(&self, conn: ConnectionId, request: &ChatRequest) -> Result<usize, RoomError> {
        let ChatRequest {
            user_name,
            msg,
            room_id,
        } = request;
        if room_id.is_empty() || msg.trim().is_empty() {
            return Err(RoomError::invalid("roomId and msg are required"));
        }

        let hub = self.hub.lock().await;
        if !hub.is_member(conn, room_id) {
            return Err(RoomError::state("not in this room"));
        }
        let user_name = if user_name.trim().is_empty() {
            self.registry
                .lock()
                .await
                .lookup(conn)
                .map(|u| u.to_string())
                .unwrap_or_default()
        } else {
            user_name.clone()
        };
        Ok(hub.broadcast(
            room_id,
            &ServerEvent::Chat {
                user_name,
                msg: msg.clone(),
            },
        ))
    }
}
