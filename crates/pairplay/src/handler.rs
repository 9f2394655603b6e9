//! Per-connection handler: outbound writer, read loop, and event dispatch.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbound channel with the room manager
//!   2. Spawn a writer task that drains the channel into the socket
//!   3. Loop: receive frames → decode `ClientEvent` → dispatch
//!   4. On exit, the drop guard runs disconnect cleanup
//!
//! Every server → client event, direct replies included, goes through the
//! outbound channel, so a connection sees events in the order they were
//! queued.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use pairplay_protocol::{ClientEvent, Codec, ServerEvent};
use pairplay_room::{ErrorKind, RoomError};
use pairplay_transport::{Connection, ConnectionId, WebSocketConnection};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::PairplayError;
use crate::server::ServerState;

/// Drop guard that runs disconnect cleanup when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async work.
struct DisconnectGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.rooms.disconnecting(conn_id).await;
            state.rooms.disconnected(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), PairplayError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    state.rooms.connect(conn_id, tx).await;
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };
    let writer = tokio::spawn(write_events(Arc::clone(&conn), Arc::clone(&state), rx));

    loop {
        let text = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(text))) => text,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection timed out");
                let _ = conn.close().await;
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                state
                    .rooms
                    .emit_to(conn_id, ServerEvent::error("invalid data", raw_payload(&text)))
                    .await;
                continue;
            }
        };

        let name = event.name();
        tracing::debug!(%conn_id, event = name, "event received");
        if let Err(err) = dispatch(&state, conn_id, &event).await {
            match err.kind() {
                ErrorKind::Storage => {
                    tracing::warn!(%conn_id, event = name, error = %err, "storage failure");
                }
                _ => tracing::debug!(%conn_id, event = name, error = %err, "event rejected"),
            }
            state
                .rooms
                .emit_to(conn_id, ServerEvent::error(err.message(), event.payload()))
                .await;
        }
    }

    writer.abort();
    // _guard drops here → disconnect cleanup fires.
    Ok(())
}

/// Drains the outbound queue into the socket until either side goes away.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let conn_id = conn.id();
    while let Some(event) = rx.recv().await {
        let text = match state.codec.encode(&event) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&text).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Runs one client event against the room manager.
///
/// Events that answer only the sender (`room_created`, `room_list`,
/// `pong`) are queued here; everything else is emitted by the manager.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    event: &ClientEvent,
) -> Result<(), RoomError> {
    let rooms = &state.rooms;
    match event {
        ClientEvent::JoinIntoRoom(request) => {
            rooms.quick_match(conn_id, &request.user).await?;
        }
        ClientEvent::JoinIntoCustomRoom(request) => {
            rooms.join_custom_room(conn_id, request).await?;
        }
        ClientEvent::RejoinIntoRoom(request) => {
            rooms.rejoin(conn_id, request).await?;
        }
        ClientEvent::PlayGame(request) => {
            rooms.start_game(conn_id, request).await?;
        }
        ClientEvent::GamePlaying(request) => {
            rooms.play_move(conn_id, request).await?;
        }
        ClientEvent::GameOver(request) => {
            rooms.finish_game(conn_id, request).await?;
        }
        ClientEvent::PlayerLeft(request) => {
            rooms.leave_room(conn_id, &request.room_id).await?;
        }
        ClientEvent::Chat(request) => {
            rooms.chat(conn_id, request).await?;
        }
        ClientEvent::CreateCustomRoom(request) => {
            let room = rooms
                .create_custom_room(&request.user_id, &request.room_name, &request.password)
                .await?;
            rooms.identify(conn_id, request.user_id.clone()).await;
            rooms
                .emit_to(
                    conn_id,
                    ServerEvent::RoomCreated {
                        room_id: room.room_id,
                        room_name: room.room_name,
                    },
                )
                .await;
        }
        ClientEvent::ListMyRooms(request) => {
            let listed = rooms.rooms_for_user(&request.user_id).await?;
            let summaries = listed.iter().map(|room| room.summary()).collect();
            rooms
                .emit_to(conn_id, ServerEvent::RoomList { rooms: summaries })
                .await;
        }
        ClientEvent::Ping(request) => {
            rooms
                .emit_to(
                    conn_id,
                    ServerEvent::Pong {
                        client_time: request.client_time,
                        server_time: now_millis(),
                    },
                )
                .await;
        }
    }
    Ok(())
}

/// The frame as JSON if it parses, else as a string, for echoing back.
fn raw_payload(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_payload_keeps_json() {
        let value = raw_payload(r#"{"event":"nope"}"#);
        assert_eq!(value["event"], "nope");
    }

    #[test]
    fn test_raw_payload_falls_back_to_string() {
        assert_eq!(raw_payload("not json"), Value::String("not json".into()));
    }

    #[test]
    fn test_now_millis_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
