//! End-to-end tests: real WebSocket clients against a server on a random
//! port.
//!
//! Events are read as `serde_json::Value` so the assertions pin the JSON
//! shapes browser clients depend on.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use impostor::prelude::*;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Upper bound on waiting for any single event.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Timings short enough that a whole game fits in a test.
fn fast_config() -> GameConfig {
    GameConfig {
        reveal_delay: Duration::from_millis(50),
        turn_timeout: Duration::from_secs(10),
        vote_timeout: Duration::from_secs(10),
        results_delay: Duration::from_millis(50),
        game_over_delay: Duration::from_millis(50),
        words: vec!["lantern".into()],
        ..GameConfig::default()
    }
}

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = ImpostorServerBuilder::new()
        .bind("127.0.0.1:0")
        .game_config(fast_config())
        .rng_seed(11)
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

struct Client {
    ws: ClientWs,
    id: u64,
}

/// Connects and consumes the `welcome` frame.
async fn connect(addr: &str) -> Client {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    let welcome = recv(&mut ws).await;
    assert_eq!(welcome["type"], "welcome");
    let id = welcome["id"].as_u64().expect("welcome carries a numeric id");
    Client { ws, id }
}

async fn send(ws: &mut ClientWs, frame: Value) {
    ws.send(Message::text(frame.to_string()))
        .await
        .expect("send frame");
}

async fn recv(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("websocket error");
        if msg.is_text() {
            return serde_json::from_slice(&msg.into_data()).expect("event is JSON");
        }
    }
}

/// Skips events until one of the given types arrives.
async fn expect_any(ws: &mut ClientWs, types: &[&str]) -> Value {
    loop {
        let event = recv(ws).await;
        if types.iter().any(|t| event["type"] == *t) {
            return event;
        }
    }
}

async fn expect(ws: &mut ClientWs, ty: &str) -> Value {
    expect_any(ws, &[ty]).await
}

/// Connects `n` clients and joins them to `room`, the first as host.
async fn room_of(addr: &str, room: &str, n: usize) -> Vec<Client> {
    let mut clients = Vec::new();
    for i in 0..n {
        let mut client = connect(addr).await;
        send(
            &mut client.ws,
            json!({"type": "join", "room": room, "name": format!("p{i}")}),
        )
        .await;
        expect(&mut client.ws, "joined").await;
        clients.push(client);
    }
    clients
}

// =========================================================================
// Connection
// =========================================================================

#[tokio::test]
async fn test_each_connection_gets_a_distinct_id() {
    let addr = start_server().await;
    let a = connect(&addr).await;
    let b = connect(&addr).await;
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_malformed_frame_is_reported_and_connection_survives() {
    let addr = start_server().await;
    let mut client = connect(&addr).await;

    client.ws.send(Message::text("not json".to_string())).await.unwrap();
    let error = recv(&mut client.ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["kind"], "malformed");

    send(&mut client.ws, json!({"type": "teleport"})).await;
    assert_eq!(recv(&mut client.ws).await["kind"], "malformed");

    send(&mut client.ws, json!({"type": "listRooms"})).await;
    assert_eq!(recv(&mut client.ws).await["type"], "roomList");
}

#[tokio::test]
async fn test_room_action_before_join_is_rejected() {
    let addr = start_server().await;
    let mut client = connect(&addr).await;

    send(&mut client.ws, json!({"type": "ready"})).await;
    let error = recv(&mut client.ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["kind"], "protocolViolation");
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_join_and_room_list() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;

    send(&mut host.ws, json!({"type": "listRooms"})).await;
    let list = recv(&mut host.ws).await;
    assert_eq!(list["rooms"], json!([]));

    send(&mut host.ws, json!({"type": "join", "room": "den", "name": "Ada"})).await;
    let joined = expect(&mut host.ws, "joined").await;
    assert_eq!(joined["room"], "den");
    assert_eq!(joined["hostId"], host.id);
    assert_eq!(joined["players"][0]["name"], "Ada");

    let lobby = expect(&mut host.ws, "lobbyInfo").await;
    assert_eq!(lobby["count"], 1);

    send(&mut host.ws, json!({"type": "listRooms"})).await;
    let list = expect(&mut host.ws, "roomList").await;
    assert_eq!(
        list["rooms"],
        json!([{"id": "den", "count": 1, "inGame": false}])
    );
}

/// Skips room lists until one reports `room` with `count` members, or no
/// such room when `count` is 0.
async fn expect_room_count(ws: &mut ClientWs, room: &str, count: u64) -> Value {
    loop {
        let list = expect(ws, "roomList").await;
        let listed = list["rooms"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["id"] == room)
            .map_or(0, |r| r["count"].as_u64().unwrap());
        if listed == count {
            return list;
        }
    }
}

#[tokio::test]
async fn test_room_list_is_pushed_to_idle_connections() {
    let addr = start_server().await;
    let mut watcher = connect(&addr).await;

    let mut clients = room_of(&addr, "den", 1).await;
    let list = expect_room_count(&mut watcher.ws, "den", 1).await;
    assert_eq!(
        list["rooms"],
        json!([{"id": "den", "count": 1, "inGame": false}])
    );

    let mut guest = connect(&addr).await;
    send(&mut guest.ws, json!({"type": "join", "room": "den"})).await;
    expect_room_count(&mut watcher.ws, "den", 2).await;

    send(&mut guest.ws, json!({"type": "leave"})).await;
    expect_room_count(&mut watcher.ws, "den", 1).await;

    // The last member disconnecting destroys the room.
    drop(clients.remove(0));
    let list = expect_room_count(&mut watcher.ws, "den", 0).await;
    assert_eq!(list["rooms"], json!([]));
}

#[tokio::test]
async fn test_second_player_is_announced() {
    let addr = start_server().await;
    let mut clients = room_of(&addr, "den", 1).await;
    let mut guest = connect(&addr).await;

    send(&mut guest.ws, json!({"type": "join", "room": "den"})).await;
    let joined = expect(&mut guest.ws, "joined").await;
    assert_eq!(joined["hostId"], clients[0].id);
    assert_eq!(joined["players"].as_array().unwrap().len(), 2);

    let announced = expect(&mut clients[0].ws, "playerJoined").await;
    assert_eq!(announced["player"]["id"], guest.id);
    assert_eq!(announced["player"]["name"], "Player");
}

#[tokio::test]
async fn test_blank_room_name_is_malformed() {
    let addr = start_server().await;
    let mut client = connect(&addr).await;

    send(&mut client.ws, json!({"type": "join", "room": "   "})).await;
    let error = recv(&mut client.ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["kind"], "malformed");
}

#[tokio::test]
async fn test_only_the_host_can_start() {
    let addr = start_server().await;
    let mut clients = room_of(&addr, "den", 3).await;

    send(&mut clients[1].ws, json!({"type": "startGame"})).await;
    let error = expect(&mut clients[1].ws, "error").await;
    assert_eq!(error["kind"], "protocolViolation");
}

#[tokio::test]
async fn test_starting_alone_is_a_capacity_error() {
    let addr = start_server().await;
    let mut clients = room_of(&addr, "den", 1).await;

    send(&mut clients[0].ws, json!({"type": "startGame"})).await;
    let error = expect(&mut clients[0].ws, "error").await;
    assert_eq!(error["kind"], "capacity");
}

#[tokio::test]
async fn test_disconnect_is_announced_and_host_moves() {
    let addr = start_server().await;
    let mut clients = room_of(&addr, "den", 2).await;
    let host = clients.remove(0);
    let host_id = host.id;
    drop(host);

    let left = expect(&mut clients[0].ws, "playerLeft").await;
    assert_eq!(left["id"], host_id);
    let host_changed = expect(&mut clients[0].ws, "hostChanged").await;
    assert_eq!(host_changed["hostId"], clients[0].id);
}

#[tokio::test]
async fn test_explicit_leave() {
    let addr = start_server().await;
    let mut clients = room_of(&addr, "den", 2).await;

    send(&mut clients[1].ws, json!({"type": "leave"})).await;
    let left = expect(&mut clients[0].ws, "playerLeft").await;
    assert_eq!(left["id"], clients[1].id);

    send(&mut clients[1].ws, json!({"type": "leave"})).await;
    let error = expect(&mut clients[1].ws, "error").await;
    assert_eq!(error["kind"], "protocolViolation");
}

// =========================================================================
// Full game
// =========================================================================

#[tokio::test]
async fn test_full_game_impostor_voted_out() {
    let addr = start_server().await;
    let mut clients = room_of(&addr, "den", 3).await;

    send(&mut clients[0].ws, json!({"type": "startGame"})).await;

    // Exactly one impostor; everyone else sees the word.
    let mut impostor = None;
    for client in &mut clients {
        let started = expect(&mut client.ws, "gameStarted").await;
        assert_eq!(started["turnSeconds"], 10);
        match started["role"]["kind"].as_str() {
            Some("impostor") => {
                assert!(impostor.is_none(), "two impostors");
                impostor = Some(client.id);
            }
            Some("crew") => assert_eq!(started["role"]["word"], "lantern"),
            other => panic!("unexpected role {other:?}"),
        }
    }
    let impostor = impostor.expect("one impostor");

    let round = expect(&mut clients[0].ws, "roundStarted").await;
    assert_eq!(round["round"], 1);
    assert_eq!(round["order"].as_array().unwrap().len(), 3);

    // Whoever holds the turn speaks, until the round's clues are in.
    loop {
        let event = expect_any(&mut clients[0].ws, &["turnStarted", "allCluesSubmitted"]).await;
        if event["type"] == "allCluesSubmitted" {
            break;
        }
        let holder = event["id"].as_u64().unwrap();
        let speaker = clients.iter_mut().find(|c| c.id == holder).unwrap();
        send(&mut speaker.ws, json!({"type": "submitClue", "text": "glow"})).await;
    }

    let voting = expect(&mut clients[0].ws, "votingStarted").await;
    assert_eq!(voting["players"].as_array().unwrap().len(), 3);

    let crew: Vec<u64> = clients.iter().map(|c| c.id).filter(|&id| id != impostor).collect();
    for client in &mut clients {
        let target = if client.id == impostor { crew[0] } else { impostor };
        send(&mut client.ws, json!({"type": "voteImpostor", "targetId": target})).await;
    }

    let ejected = expect(&mut clients[0].ws, "playerEjected").await;
    assert_eq!(ejected["id"], impostor);
    assert_eq!(ejected["wasImpostor"], true);

    let over = expect(&mut clients[0].ws, "gameOver").await;
    assert_eq!(over["reason"], "impostorEjected");
    assert_eq!(over["impostorId"], impostor);
    assert_eq!(over["word"], "lantern");
    for standing in over["standings"].as_array().unwrap() {
        let expected = if standing["id"] == impostor { 0 } else { 1 };
        assert_eq!(standing["score"], expected);
    }

    let lobby = expect(&mut clients[0].ws, "lobbyInfo").await;
    assert_eq!(lobby["count"], 3);
}

#[tokio::test]
async fn test_out_of_turn_clue_is_rejected() {
    let addr = start_server().await;
    let mut clients = room_of(&addr, "den", 3).await;
    send(&mut clients[0].ws, json!({"type": "startGame"})).await;

    let turn = expect(&mut clients[0].ws, "turnStarted").await;
    let holder = turn["id"].as_u64().unwrap();
    let other = clients.iter_mut().find(|c| c.id != holder).unwrap();

    send(&mut other.ws, json!({"type": "submitClue", "text": "sneaky"})).await;
    let error = expect(&mut other.ws, "error").await;
    assert_eq!(error["kind"], "protocolViolation");
}
