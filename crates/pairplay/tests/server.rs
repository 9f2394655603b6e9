//! End-to-end tests: a real server on an ephemeral port, driven by
//! WebSocket clients speaking the JSON event protocol.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pairplay::prelude::*;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    start_with(PairplayServer::builder()).await
}

async fn start_with(builder: PairplayServerBuilder) -> String {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    ws.send(Message::text(frame)).await.expect("send should succeed");
}

/// Reads the next event frame as JSON.
async fn recv(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("server sent invalid JSON");
        }
    }
}

/// Reads events until one named `name` arrives, returning its `data`.
async fn wait_for(ws: &mut ClientWs, name: &str) -> Value {
    loop {
        let event = recv(ws).await;
        if event["event"] == name {
            return event["data"].clone();
        }
    }
}

/// Two clients paired by quick match. Returns them with the room id.
async fn paired(addr: &str) -> (ClientWs, ClientWs, String) {
    let mut alice = connect(addr).await;
    send(&mut alice, "join_into_room", json!({ "user": "alice" })).await;
    let joined = wait_for(&mut alice, "emit_joined_into_room").await;
    let room_id = joined["roomId"].as_str().expect("roomId").to_string();

    let mut bob = connect(addr).await;
    send(&mut bob, "join_into_room", json!({ "user": "bob" })).await;
    wait_for(&mut alice, "match_found").await;
    wait_for(&mut bob, "match_found").await;
    (alice, bob, room_id)
}

// =========================================================================
// Matchmaking
// =========================================================================

#[tokio::test]
async fn test_quick_match_pairs_two_clients() {
    let addr = start_server().await;

    let mut alice = connect(&addr).await;
    send(&mut alice, "join_into_room", json!({ "user": "alice" })).await;
    let joined = wait_for(&mut alice, "emit_joined_into_room").await;
    let count = wait_for(&mut alice, "number_of_clients").await;
    assert_eq!(count["count"], 1);

    let mut bob = connect(&addr).await;
    send(&mut bob, "join_into_room", json!({ "user": "bob" })).await;
    let bob_joined = wait_for(&mut bob, "emit_joined_into_room").await;
    assert_eq!(bob_joined["roomId"], joined["roomId"]);

    let seen_by_alice = wait_for(&mut alice, "match_found").await;
    let seen_by_bob = wait_for(&mut bob, "match_found").await;
    assert_eq!(seen_by_alice["roomId"], joined["roomId"]);
    assert_eq!(seen_by_bob["roomId"], joined["roomId"]);
}

#[tokio::test]
async fn test_third_client_gets_a_new_room() {
    let addr = start_server().await;
    let (_alice, _bob, room_id) = paired(&addr).await;

    let mut carol = connect(&addr).await;
    send(&mut carol, "join_into_room", json!({ "user": "carol" })).await;
    let joined = wait_for(&mut carol, "emit_joined_into_room").await;
    assert_ne!(joined["roomId"], room_id.as_str());
}

#[tokio::test]
async fn test_custom_room_create_and_join() {
    let addr = start_server().await;

    let mut alice = connect(&addr).await;
    send(
        &mut alice,
        "create_custom_room",
        json!({ "userId": "alice", "roomName": "Den", "password": "pw" }),
    )
    .await;
    let created = wait_for(&mut alice, "room_created").await;
    assert_eq!(created["roomName"], "Den");
    let room_id = created["roomId"].clone();

    let mut bob = connect(&addr).await;
    send(
        &mut bob,
        "join_into_custom_room",
        json!({ "userId": "bob", "id": room_id, "password": "wrong" }),
    )
    .await;
    let err = wait_for(&mut bob, "game_error").await;
    assert_eq!(err["success"], false);
    assert_eq!(err["message"], "Invalid password");
    assert_eq!(err["data"]["password"], "wrong");

    send(
        &mut bob,
        "join_into_custom_room",
        json!({ "userId": "bob", "id": room_id, "password": "pw" }),
    )
    .await;
    let joined = wait_for(&mut bob, "emit_joined_into_room").await;
    assert_eq!(joined["roomId"], room_id);

    send(
        &mut alice,
        "join_into_custom_room",
        json!({ "userId": "alice", "id": room_id, "password": "pw" }),
    )
    .await;
    wait_for(&mut alice, "match_found").await;
    wait_for(&mut bob, "match_found").await;
}

#[tokio::test]
async fn test_custom_join_unknown_room() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    send(
        &mut ws,
        "join_into_custom_room",
        json!({ "userId": "bob", "id": "nope", "password": "pw" }),
    )
    .await;
    let err = wait_for(&mut ws, "game_error").await;
    assert_eq!(err["message"], "room not found");
}

#[tokio::test]
async fn test_list_my_rooms_hides_password() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    send(
        &mut ws,
        "create_custom_room",
        json!({ "userId": "alice", "roomName": "Den", "password": "pw" }),
    )
    .await;
    let created = wait_for(&mut ws, "room_created").await;

    send(&mut ws, "list_my_rooms", json!({ "userId": "alice" })).await;
    let list = wait_for(&mut ws, "room_list").await;
    let rooms = list["rooms"].as_array().expect("rooms array");
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["roomId"], created["roomId"]);
    assert_eq!(rooms[0]["type"], "private");
    assert!(rooms[0].get("password").is_none());
}

// =========================================================================
// Leaving
// =========================================================================

#[tokio::test]
async fn test_disconnect_notifies_peer() {
    let addr = start_server().await;
    let (mut alice, mut bob, room_id) = paired(&addr).await;

    bob.close(None).await.expect("close should succeed");
    let left = wait_for(&mut alice, "player_left").await;
    assert_eq!(left["message"], "the other player left the room");

    // The room is gone: a rejoin finds nothing.
    tokio::time::sleep(Duration::from_millis(50)).await;
    send(
        &mut alice,
        "rejoin_into_room",
        json!({ "userId": "alice", "roomId": room_id }),
    )
    .await;
    let err = wait_for(&mut alice, "game_error").await;
    assert_eq!(err["message"], "room not found");
}

#[tokio::test]
async fn test_voluntary_leave_notifies_peer() {
    let addr = start_server().await;
    let (mut alice, mut bob, room_id) = paired(&addr).await;

    send(&mut bob, "player_left", json!({ "roomId": room_id })).await;
    let left = wait_for(&mut alice, "player_left").await;
    assert_eq!(left["message"], "the other player left the room");
}

#[tokio::test]
async fn test_idle_connection_is_dropped() {
    let addr = start_with(PairplayServer::builder().idle_timeout(Duration::from_millis(100))).await;
    let mut ws = connect(&addr).await;

    let ended = tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "server should drop an idle connection");
}

// =========================================================================
// Relay
// =========================================================================

#[tokio::test]
async fn test_game_start_and_moves() {
    let addr = start_server().await;
    let (mut alice, mut bob, room_id) = paired(&addr).await;

    send(
        &mut alice,
        "play_game",
        json!({ "roomId": room_id, "userId": "alice" }),
    )
    .await;
    let started = wait_for(&mut alice, "game_started").await;
    wait_for(&mut bob, "game_started").await;
    assert_eq!(started["moves"], 0);

    let first = started["turn"].as_str().expect("turn").to_string();
    let (mover, waiter, waiter_name) = if first == "alice" {
        (&mut alice, &mut bob, "bob")
    } else {
        (&mut bob, &mut alice, "alice")
    };

    send(
        waiter,
        "game_playing",
        json!({ "roomId": room_id, "userId": waiter_name, "data": [0] }),
    )
    .await;
    let err = wait_for(waiter, "game_error").await;
    assert_eq!(err["message"], "not your turn");

    send(
        mover,
        "game_playing",
        json!({ "roomId": room_id, "userId": first, "data": ["X"] }),
    )
    .await;
    let seen = wait_for(waiter, "game_playing").await;
    assert_eq!(seen["moves"], 1);
    assert_eq!(seen["turn"], waiter_name);
    assert_eq!(seen["data"][0], "X");
}

#[tokio::test]
async fn test_game_over_reports_scores() {
    let addr = start_server().await;
    let (mut alice, mut bob, room_id) = paired(&addr).await;

    send(
        &mut alice,
        "play_game",
        json!({ "roomId": room_id, "userId": "alice" }),
    )
    .await;
    wait_for(&mut bob, "game_started").await;

    send(
        &mut bob,
        "game_over",
        json!({ "player1": "alice", "player2": "bob", "winner": "bob" }),
    )
    .await;
    let result = wait_for(&mut alice, "game_over").await;
    assert_eq!(result["winner"], "bob");
    let scores = result["scores"].as_array().expect("scores");
    let bob_score = scores
        .iter()
        .find(|s| s["userId"] == "bob")
        .expect("bob scored");
    assert_eq!(bob_score["points"], 5);
}

#[tokio::test]
async fn test_chat_reaches_both_players() {
    let addr = start_server().await;
    let (mut alice, mut bob, room_id) = paired(&addr).await;

    send(
        &mut alice,
        "chat",
        json!({ "userName": "Alice", "msg": "gl hf", "roomId": room_id }),
    )
    .await;
    let got = wait_for(&mut bob, "chat").await;
    assert_eq!(got["userName"], "Alice");
    assert_eq!(got["msg"], "gl hf");
    wait_for(&mut alice, "chat").await;
}

// =========================================================================
// Framing
// =========================================================================

#[tokio::test]
async fn test_invalid_frame_gets_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("garbage")).await.expect("send");
    let err = wait_for(&mut ws, "game_error").await;
    assert_eq!(err["message"], "invalid data");
    assert_eq!(err["data"], "garbage");

    // The connection survives a bad frame.
    send(&mut ws, "ping", json!({ "clientTime": 1 })).await;
    wait_for(&mut ws, "pong").await;
}

#[tokio::test]
async fn test_unknown_event_gets_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    send(&mut ws, "fly_to_moon", json!({})).await;
    let err = wait_for(&mut ws, "game_error").await;
    assert_eq!(err["message"], "invalid data");
    assert_eq!(err["data"]["event"], "fly_to_moon");
}

#[tokio::test]
async fn test_ping_pong() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    send(&mut ws, "ping", json!({ "clientTime": 42 })).await;
    let pong = wait_for(&mut ws, "pong").await;
    assert_eq!(pong["clientTime"], 42);
    assert!(pong["serverTime"].as_u64().expect("serverTime") > 0);
}

#[tokio::test]
async fn test_validation_errors_echo_payload() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    send(&mut ws, "join_into_room", json!({ "user": "" })).await;
    let err = wait_for(&mut ws, "game_error").await;
    assert_eq!(err["message"], "invalid data");
    assert_eq!(err["data"]["user"], "");
}
