mod support;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect() -> WsClient {
    let addr = support::ensure_server();
    let (stream, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket connect");
    stream
}

async fn send_json(client: &mut WsClient, value: Value) {
    client
        .send(Message::Text(value.to_string()))
        .await
        .expect("send client message");
}

// Next JSON message from the server, skipping control frames.
async fn next_msg(client: &mut WsClient) -> Value {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            let frame = client
                .next()
                .await
                .expect("stream open")
                .expect("frame ok");
            if let Message::Text(text) = frame {
                return serde_json::from_str::<Value>(&text).expect("valid server json");
            }
        }
    })
    .await
    .expect("server message within deadline")
}

// Next message of the given type, skipping unrelated broadcasts (other
// tests share the same world).
async fn next_msg_of(client: &mut WsClient, kind: &str) -> Value {
    for _ in 0..200 {
        let msg = next_msg(client).await;
        if msg["type"] == kind {
            return msg;
        }
    }
    panic!("no {kind} message arrived");
}

#[tokio::test]
async fn full_session_join_move_bomb_eliminate() {
    let mut alice = connect().await;
    send_json(&mut alice, json!({"type": "join"})).await;

    let identity = next_msg_of(&mut alice, "identity").await;
    let alice_id = identity["data"]["playerId"]
        .as_str()
        .expect("string player id")
        .to_string();

    let map_init = next_msg_of(&mut alice, "mapInit").await;
    let grid = map_init["data"]["grid"].as_array().expect("grid rows");
    assert_eq!(grid.len(), 13);
    assert_eq!(grid[0].as_array().unwrap().len(), 15);
    // Border row is solid wall.
    assert!(grid[0].as_array().unwrap().iter().all(|t| t == 1));
    assert!(
        map_init["data"]["players"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p["id"] == alice_id.as_str()),
        "snapshot includes the joining player"
    );

    let stats = next_msg_of(&mut alice, "statsChanged").await;
    assert_eq!(stats["data"]["bombCapacity"], 1);
    assert_eq!(stats["data"]["blastRange"], 1);
    assert_eq!(stats["data"]["speedLevel"], 1);

    // A second player joining is announced to the first.
    let mut bob = connect().await;
    send_json(&mut bob, json!({"type": "join"})).await;
    let bob_identity = next_msg_of(&mut bob, "identity").await;
    let bob_id = bob_identity["data"]["playerId"].as_str().unwrap().to_string();

    let joined = next_msg_of(&mut alice, "playerJoined").await;
    assert_eq!(joined["data"]["id"], bob_id.as_str());

    let bob_map = next_msg_of(&mut bob, "mapInit").await;
    assert_eq!(bob_map["data"]["players"].as_array().unwrap().len(), 2);

    // Spawn protection guarantees the cell right of (1,1) is open.
    send_json(&mut alice, json!({"type": "move", "data": {"direction": "right"}})).await;
    let moved = loop {
        let msg = next_msg_of(&mut alice, "playerMoved").await;
        if msg["data"]["id"] == alice_id.as_str() {
            break msg;
        }
    };
    assert_eq!(moved["data"]["x"], 2);
    assert_eq!(moved["data"]["y"], 1);
    assert_eq!(moved["data"]["direction"], "right");
    assert_eq!(moved["data"]["durationMs"], 280);

    // Moving into the border wall comes back rejected with zero duration.
    send_json(&mut alice, json!({"type": "move", "data": {"direction": "up"}})).await;
    let rejected = loop {
        let msg = next_msg_of(&mut alice, "playerMoved").await;
        if msg["data"]["id"] == alice_id.as_str() {
            break msg;
        }
    };
    assert_eq!(rejected["data"]["durationMs"], 0);
    assert_eq!(rejected["data"]["x"], 2);

    // Disconnects broadcast a leave.
    drop(bob);
    let left = next_msg_of(&mut alice, "playerLeft").await;
    assert_eq!(left["data"]["playerId"], bob_id.as_str());

    // Place a bomb on the current (grass) cell and ride out the fuse.
    send_json(&mut alice, json!({"type": "placeBomb"})).await;
    let armed = next_msg_of(&mut alice, "tileChanged").await;
    assert_eq!(armed["data"]["x"], 2);
    assert_eq!(armed["data"]["y"], 1);
    assert_eq!(armed["data"]["tile"], 3);

    let explosion = next_msg_of(&mut alice, "explosion").await;
    let affected = explosion["data"]["affectedCells"].as_array().unwrap();
    assert!(affected.iter().any(|c| c["x"] == 2 && c["y"] == 1));

    // Standing on the origin is lethal.
    let eliminated = next_msg_of(&mut alice, "playerEliminated").await;
    assert_eq!(eliminated["data"]["playerId"], alice_id.as_str());
}

#[tokio::test]
async fn first_message_must_be_join() {
    let mut client = connect().await;
    send_json(
        &mut client,
        json!({"type": "move", "data": {"direction": "down"}}),
    )
    .await;

    // The server closes the socket instead of spawning a player.
    let deadline = Duration::from_secs(5);
    let closed = tokio::time::timeout(deadline, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(_))) | None => break true,
                Some(Ok(_)) => continue,
                Some(Err(_)) => break true,
            }
        }
    })
    .await
    .expect("close within deadline");
    assert!(closed);
}
