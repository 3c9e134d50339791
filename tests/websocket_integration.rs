//! End-to-end coverage over a real TCP socket: bind the actual router,
//! connect with `tokio-tungstenite`, authenticate with a signed session
//! cookie, and drive a room through join/start/move. Grounded on the
//! teacher's `tests/e2e_tests.rs` (`start_test_server`/`connect_client`
//! shape), adapted to this crate's cookie-based auth instead of a bearer
//! token and to the `/ws/game/{room_id}` path instead of `/v2/ws`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dicewars_room_engine::auth::sign_session_cookie;
use dicewars_room_engine::config::{OrchestratorConfig, SecurityConfig};
use dicewars_room_engine::engine::room::{GameKind, Room, RoomId};
use dicewars_room_engine::handlers::Engine;
use dicewars_room_engine::hub::Hub;
use dicewars_room_engine::protocol::{ClientMessage, ServerMessage};
use dicewars_room_engine::store::{MemoryRoomStore, RoomStore};
use dicewars_room_engine::websocket::{create_router, AppState};
use http::HeaderValue;
use once_cell::sync::Lazy;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

const TEST_SECRET: &str = "integration-test-secret";

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
});

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn start_server() -> (SocketAddr, Arc<MemoryRoomStore>) {
    Lazy::force(&TRACING);

    let store = Arc::new(MemoryRoomStore::new_for_tests());
    let hub = Arc::new(Hub::new());
    let engine = Arc::new(Engine::new(
        store.clone(),
        hub,
        OrchestratorConfig::zero(),
    ));
    let security = Arc::new(SecurityConfig {
        cors_origins: vec!["*".to_string()],
        session_secret: TEST_SECRET.to_string(),
        max_message_size: 16 * 1024,
    });
    let state = AppState { engine, security };
    let router = create_router(state, &["*".to_string()]);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, store)
}

async fn connect(addr: SocketAddr, room_id: RoomId, user: &str) -> Client {
    let cookie = sign_session_cookie(
        TEST_SECRET.as_bytes(),
        user,
        chrono::Utc::now() + chrono::Duration::hours(1),
    );
    let url = format!("ws://{addr}/ws/game/{room_id}");
    let mut request = url.into_client_request().unwrap();
    request.headers_mut().insert(
        "Cookie",
        HeaderValue::from_str(&format!("session_user={cookie}")).unwrap(),
    );

    let (stream, _) = tokio::time::timeout(Duration::from_secs(5), connect_async(request))
        .await
        .expect("handshake timed out")
        .expect("handshake failed");
    stream
}

async fn send(client: &mut Client, message: &ClientMessage) {
    let json = serde_json::to_string(message).unwrap();
    client.send(Message::Text(json.into())).await.unwrap();
}

async fn recv(client: &mut Client) -> ServerMessage {
    use futures_util::StreamExt;
    let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("connection closed")
        .expect("websocket error");
    match frame {
        Message::Text(text) => serde_json::from_str(&text).expect("valid ServerMessage"),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

use futures_util::SinkExt;

async fn seed_waiting_room(store: &MemoryRoomStore, host: &str) -> RoomId {
    let id = Uuid::new_v4();
    let room = Room::new(
        id,
        GameKind::dicewars(),
        host.to_string(),
        false,
        vec![],
        chrono::Utc::now(),
    );
    store.create_room(room).await.unwrap();
    id
}

#[tokio::test]
async fn joining_over_a_real_socket_broadcasts_to_the_host() {
    let (addr, store) = start_server().await;
    let room_id = seed_waiting_room(&store, "alice").await;

    let mut host = connect(addr, room_id, "alice").await;
    assert!(matches!(recv(&mut host).await, ServerMessage::RoomState(_))); // own solo snapshot

    // Connecting is enough to join: bob is neither full nor already seated,
    // so the Session auto-dispatches `JoinRoom` on his behalf.
    let mut guest = connect(addr, room_id, "bob").await;
    assert!(matches!(recv(&mut guest).await, ServerMessage::RoomState(_))); // bob's pre-join snapshot

    assert!(matches!(
        recv(&mut host).await,
        ServerMessage::PlayerJoined { player, .. } if player == "bob"
    ));
    assert!(matches!(recv(&mut host).await, ServerMessage::RoomState(_)));

    let room = store.get_room(room_id).await.unwrap().unwrap();
    assert_eq!(room.players, vec!["alice".to_string(), "bob".to_string()]);
}

#[tokio::test]
async fn starting_and_moving_drives_the_game_over_the_wire() {
    let (addr, store) = start_server().await;
    let room_id = seed_waiting_room(&store, "alice").await;

    let mut host = connect(addr, room_id, "alice").await;
    let _ = recv(&mut host).await; // host's own solo snapshot on connect

    let mut guest = connect(addr, room_id, "bob").await;
    let _ = recv(&mut guest).await; // bob's pre-join snapshot, sent before the auto-join runs
    let _ = recv(&mut host).await; // PlayerJoined, from the auto-dispatched JoinRoom
    let _ = recv(&mut host).await; // RoomState
    let _ = recv(&mut guest).await; // PlayerJoined (guest is already registered with the Hub)
    let _ = recv(&mut guest).await; // RoomState

    send(&mut host, &ClientMessage::StartGame { room_id }).await;
    // The first turn is chosen uniformly at random among the seated
    // players, so either alice or bob may go first.
    let first_turn = match recv(&mut host).await {
        ServerMessage::GameStarted { first_turn, .. } => first_turn,
        other => panic!("expected GameStarted, got {other:?}"),
    };
    assert!(first_turn == "alice" || first_turn == "bob");
    let _ = recv(&mut host).await; // RoomState
    let _ = recv(&mut guest).await; // GameStarted
    let _ = recv(&mut guest).await; // RoomState

    let (mover, other, other_name) = if first_turn == "alice" {
        (&mut host, &mut guest, "bob")
    } else {
        (&mut guest, &mut host, "alice")
    };

    send(mover, &ClientMessage::MakeMove { room_id, row: 0, col: 0 }).await;
    let expected_mover = first_turn.clone();
    assert!(matches!(
        recv(mover).await,
        ServerMessage::MovePending { player, row: 0, col: 0, .. } if player == expected_mover
    ));
    assert!(matches!(recv(other).await, ServerMessage::MovePending { .. }));
    // Placing on (0,0) with a count of 3 isn't critical, so there's no
    // explosion wave: one snapshot after the placement settles, then a
    // second after the (empty) wave loop drains, then the turn change.
    assert!(matches!(recv(mover).await, ServerMessage::RoomState(_)));
    assert!(matches!(recv(other).await, ServerMessage::RoomState(_)));
    assert!(matches!(recv(mover).await, ServerMessage::RoomState(_)));
    assert!(matches!(recv(other).await, ServerMessage::RoomState(_)));
    assert!(matches!(recv(mover).await, ServerMessage::TurnChanged { .. }));
    assert!(matches!(recv(other).await, ServerMessage::TurnChanged { .. }));

    let room = store.get_room(room_id).await.unwrap().unwrap();
    assert_eq!(room.board[&(0, 0)].owner, first_turn);
    assert_eq!(room.current_turn.as_deref(), Some(other_name));
}

#[tokio::test]
async fn connecting_to_a_nonexistent_room_is_rejected_before_the_upgrade() {
    let (addr, _store) = start_server().await;
    let room_id = Uuid::new_v4(); // never created

    let cookie = sign_session_cookie(
        TEST_SECRET.as_bytes(),
        "alice",
        chrono::Utc::now() + chrono::Duration::hours(1),
    );
    let url = format!("ws://{addr}/ws/game/{room_id}");
    let mut request = url.into_client_request().unwrap();
    request.headers_mut().insert(
        "Cookie",
        HeaderValue::from_str(&format!("session_user={cookie}")).unwrap(),
    );

    let err = connect_async(request).await.unwrap_err();
    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status().as_u16(), 404);
        }
        other => panic!("expected an HTTP 404 handshake rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn an_unsigned_connection_is_rejected_before_the_upgrade() {
    let (addr, _store) = start_server().await;
    let room_id = Uuid::new_v4();
    let url = format!("ws://{addr}/ws/game/{room_id}");
    let request = url.into_client_request().unwrap();

    let err = connect_async(request).await.unwrap_err();
    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status().as_u16(), 401);
        }
        other => panic!("expected an HTTP 401 handshake rejection, got {other:?}"),
    }
}
