//! Integration tests for the WebSocket protocol over a real socket.

mod helpers;

use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use helpers::{TEST_JWT_SECRET, TestApp};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn token_for(subject: &str) -> String {
    let now = Utc::now().timestamp();
    encode(
        &Header::default(),
        &json!({ "sub": subject, "iat": now, "exp": now + 600 }),
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn connect(addr: SocketAddr, token: Option<&str>) -> Socket {
    let url = match token {
        Some(token) => format!("ws://{addr}/ws?token={token}"),
        None => format!("ws://{addr}/ws"),
    };
    let (socket, _) = connect_async(url).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, frame: Value) {
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

/// Next JSON frame, skipping server pings.
async fn recv(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            let frame: Value = serde_json::from_str(text.as_str()).unwrap();
            if frame["type"] != "ping" {
                return frame;
            }
        }
    }
}

async fn recv_type(socket: &mut Socket, kind: &str) -> Value {
    let frame = recv(socket).await;
    assert_eq!(frame["type"], kind, "unexpected frame: {frame}");
    frame
}

#[tokio::test]
async fn test_jam_round_trip_over_websocket() {
    let addr = TestApp::new().spawn().await;
    let mut host = connect(addr, None).await;
    let mut guest = connect(addr, None).await;
    recv_type(&mut host, "connected").await;
    recv_type(&mut guest, "connected").await;

    send(
        &mut host,
        json!({"type": "create_session", "name": "Friday Mix", "nickname": "Host"}),
    )
    .await;
    let created = recv_type(&mut host, "session_created").await;
    let code = created["jam_code"].as_str().unwrap().to_string();
    assert!(created["shareable_link"].as_str().unwrap().ends_with(&code));

    send(
        &mut guest,
        json!({"type": "join_session", "jam_code": code, "nickname": "Guest"}),
    )
    .await;
    let joined = recv_type(&mut guest, "session_join_success").await;
    assert_eq!(joined["jam"]["code"], code.as_str());
    recv_type(&mut host, "members_changed").await;

    send(
        &mut host,
        json!({
            "type": "add_track",
            "jam_code": code,
            "track": {"title": "Song A", "source": {"kind": "youtube", "video_id": "abc"}}
        }),
    )
    .await;
    let update = recv_type(&mut guest, "playlist_updated").await;
    assert_eq!(update["playlist"][0]["title"], "Song A");
    recv_type(&mut host, "playlist_updated").await;

    send(
        &mut host,
        json!({
            "type": "sync_playback_state",
            "jam_code": code,
            "track_index": 0,
            "position": 12.5,
            "is_playing": true
        }),
    )
    .await;
    let update = recv_type(&mut guest, "playback_state_updated").await;
    assert_eq!(update["playback"]["current_position_seconds"], 12.5);
    assert_eq!(update["playback"]["is_playing"], true);

    send(&mut guest, json!({"type": "get_state", "jam_code": code})).await;
    let state = recv_type(&mut guest, "jam_state").await;
    assert_eq!(state["jam"]["playlist"].as_array().unwrap().len(), 1);

    send(&mut host, json!({"type": "leave_session", "jam_code": code})).await;
    let ended = recv_type(&mut guest, "session_ended").await;
    assert_eq!(ended["reason"], "host_left");
}

#[tokio::test]
async fn test_guest_command_rejected_with_error_frame() {
    let addr = TestApp::new().spawn().await;
    let mut host = connect(addr, None).await;
    let mut guest = connect(addr, None).await;
    recv_type(&mut host, "connected").await;
    recv_type(&mut guest, "connected").await;

    send(
        &mut host,
        json!({"type": "create_session", "name": "Mix", "nickname": "Host"}),
    )
    .await;
    let code = recv_type(&mut host, "session_created").await["jam_code"].clone();
    send(
        &mut guest,
        json!({"type": "join_session", "jam_code": code, "nickname": "Guest"}),
    )
    .await;
    recv_type(&mut guest, "session_join_success").await;
    recv_type(&mut host, "members_changed").await;

    send(
        &mut guest,
        json!({"type": "pause_playback", "jam_code": code, "position": 3.0}),
    )
    .await;
    let error = recv_type(&mut guest, "error").await;
    assert_eq!(error["code"], "FORBIDDEN");

    send(&mut guest, json!({"type": "no_such_command"})).await;
    let error = recv_type(&mut guest, "error").await;
    assert_eq!(error["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_closing_host_socket_ends_jam() {
    let addr = TestApp::new().spawn().await;
    let mut host = connect(addr, None).await;
    let mut guest = connect(addr, None).await;
    recv_type(&mut host, "connected").await;
    recv_type(&mut guest, "connected").await;

    send(
        &mut host,
        json!({"type": "create_session", "name": "Mix", "nickname": "Host"}),
    )
    .await;
    let code = recv_type(&mut host, "session_created").await["jam_code"].clone();
    send(
        &mut guest,
        json!({"type": "join_session", "jam_code": code, "nickname": "Guest"}),
    )
    .await;
    recv_type(&mut guest, "session_join_success").await;

    host.close(None).await.unwrap();

    let ended = recv_type(&mut guest, "session_ended").await;
    assert_eq!(ended["reason"], "host_disconnected");
}

#[tokio::test]
async fn test_authenticated_identity_comes_from_token() {
    let addr = TestApp::with_auth().spawn().await;
    let mut socket = connect(addr, Some(&token_for("user-42"))).await;

    let connected = recv_type(&mut socket, "connected").await;
    assert_eq!(connected["identity"], "user-42");
}

#[tokio::test]
async fn test_bad_token_is_refused() {
    let addr = TestApp::with_auth().spawn().await;

    let result = connect_async(format!("ws://{addr}/ws?token=garbage")).await;
    assert!(result.is_err());
}
