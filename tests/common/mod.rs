#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use polarize::messages::{ClientMessage, ServerMessage};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub struct TestServer {
    base_url: String,
}

impl TestServer {
    pub fn ws_url(&self) -> String {
        format!("{}/ws", self.base_url)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!(
            "http://{}{}",
            self.base_url.strip_prefix("ws://").unwrap(),
            path
        )
    }
}

pub async fn spawn_test_server() -> TestServer {
    spawn_test_server_with_timeouts(None).await
}

/// Boot the app on an ephemeral port, optionally shrinking the vote
/// timeout and results-display delay so tests run fast.
pub async fn spawn_test_server_with_timeouts(
    timeouts: Option<(Duration, Duration)>,
) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let app = polarize::app_with_config(timeouts);
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("ws://{}", addr),
    }
}

pub async fn connect(server: &TestServer) -> WsStream {
    let (ws, _) = connect_async(&server.ws_url())
        .await
        .expect("Failed to connect");
    ws
}

fn text(msg: &ClientMessage) -> Message {
    Message::Text(serde_json::to_string(msg).unwrap().into())
}

pub fn create_room_msg(nickname: &str) -> Message {
    text(&ClientMessage::CreateRoom {
        nickname: nickname.to_string(),
    })
}

pub fn join_room_msg(room_id: &str, nickname: &str) -> Message {
    text(&ClientMessage::JoinRoom {
        room_id: room_id.to_string(),
        nickname: nickname.to_string(),
    })
}

pub fn reconnect_msg(room_id: &str, player_id: &str) -> Message {
    text(&ClientMessage::Reconnect {
        room_id: room_id.to_string(),
        player_id: player_id.to_string(),
    })
}

pub fn list_rooms_msg() -> Message {
    text(&ClientMessage::ListRooms)
}

pub fn leave_room_msg() -> Message {
    text(&ClientMessage::LeaveRoom)
}

pub fn start_game_msg(max_rounds: u32, minimum_variance: bool) -> Message {
    text(&ClientMessage::StartGame {
        max_rounds,
        minimum_variance,
    })
}

pub fn propose_topic_msg(topic: &str) -> Message {
    text(&ClientMessage::ProposeTopic {
        topic: topic.to_string(),
    })
}

pub fn propose_word_msg(word: &str, related_topic: &str) -> Message {
    text(&ClientMessage::ProposeWord {
        word: word.to_string(),
        related_topic: related_topic.to_string(),
    })
}

pub fn vote_msg(score: u8) -> Message {
    text(&ClientMessage::VoteOnWord { score })
}

pub fn get_game_state_msg() -> Message {
    text(&ClientMessage::GetGameState)
}

pub async fn recv(ws: &mut WsStream) -> ServerMessage {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for server message")
        .unwrap()
        .unwrap();
    serde_json::from_str(msg.to_text().unwrap()).unwrap()
}

/// A connected room of two: host Alice and guest Bob, with the join
/// broadcasts already consumed.
pub struct TwoPlayerRoom {
    pub room_id: String,
    pub host_id: String,
    pub guest_id: String,
    pub host_ws: WsStream,
    pub guest_ws: WsStream,
}

pub async fn setup_two_player_room(server: &TestServer) -> TwoPlayerRoom {
    let mut host_ws = connect(server).await;
    host_ws.send(create_room_msg("Alice")).await.unwrap();

    let (room_id, host_id) = match recv(&mut host_ws).await {
        ServerMessage::RoomCreated { room, player } => (room.id, player.id),
        other => panic!("Expected RoomCreated, got {:?}", other),
    };

    let mut guest_ws = connect(server).await;
    guest_ws.send(join_room_msg(&room_id, "Bob")).await.unwrap();

    let guest_id = match recv(&mut guest_ws).await {
        ServerMessage::PlayerJoined { player, .. } => player.id,
        other => panic!("Expected PlayerJoined, got {:?}", other),
    };
    // Host sees the join too
    assert!(matches!(
        recv(&mut host_ws).await,
        ServerMessage::PlayerJoined { .. }
    ));

    TwoPlayerRoom {
        room_id,
        host_id,
        guest_id,
        host_ws,
        guest_ws,
    }
}
