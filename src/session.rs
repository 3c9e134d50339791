//! One WebSocket connection: split into a send task (drains this session's
//! Hub channel onto the socket) and a receive task (decodes inbound frames
//! and dispatches to Command Handlers). Grounded on the teacher's
//! `websocket/connection.rs::handle_socket` split, without its message
//! batching — ordering matters more here than throughput.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::engine::room::{RoomId, RoomStatus};
use crate::handlers::{self, Engine};
use crate::protocol::{room_snapshot, ClientMessage, ServerMessage, SessionId};
use crate::store::RoomStore;

/// Drive one accepted WebSocket connection for `user` in `room_id` until it
/// closes. Registers with the Hub on entry and unregisters on every exit
/// path, including a panic-free early return on a decode error.
///
/// On connect: the room was already confirmed to exist by the upgrade
/// handler, but is re-fetched here to build the initial snapshot (it could
/// in principle have been swept by the Janitor in between); a missing room
/// at this point just means there is nothing left to serve, so the
/// connection is dropped without ever splitting the socket. Once the
/// snapshot is sent, a `waiting`, not-full room the caller isn't already
/// seated in gets an auto-dispatched `JoinRoom` — a client that connects
/// straight to a room's socket doesn't need to also send an explicit join
/// command first.
pub async fn run(engine: Arc<Engine>, socket: WebSocket, room_id: RoomId, user: String) {
    let session_id: SessionId = Uuid::new_v4();
    let mut outbox = engine.hub.register(room_id, session_id);

    let room = match engine.store.get_room(room_id).await {
        Ok(Some(room)) => room,
        _ => {
            engine.hub.unregister(room_id, session_id);
            return;
        }
    };
    engine.hub.send_to(
        room_id,
        session_id,
        ServerMessage::RoomState(room_snapshot(&room)),
    );
    if matches!(room.status, RoomStatus::Waiting) && !room.is_full() && !room.has_player(&user) {
        if let Err(err) = handlers::join_room(&engine, room_id, &user).await {
            engine.hub.send_to(
                room_id,
                session_id,
                ServerMessage::Error {
                    message: err.wire_message(),
                },
            );
        }
    }

    let (mut sink, mut stream) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            let payload = match serde_json::to_string(message.as_ref()) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "failed to encode outbound message");
                    continue;
                }
            };
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(client_message) => {
                dispatch(&engine, room_id, &user, session_id, client_message).await;
            }
            Err(err) => {
                debug!(error = %err, "dropping malformed client message");
            }
        }
    }

    engine.hub.unregister(room_id, session_id);
    send_task.abort();
}

async fn dispatch(
    engine: &Engine,
    room_id: RoomId,
    user: &str,
    session_id: SessionId,
    message: ClientMessage,
) {
    // Every variant still carries its own `room_id` field, matching the
    // original consumer's per-frame shape, but the connection is bound to
    // exactly one room via the upgrade path — that's the room we act on and
    // the one this session is registered with in the Hub, regardless of
    // what a message claims.
    let result = match message {
        ClientMessage::JoinRoom { .. } => handlers::join_room(engine, room_id, user).await,
        ClientMessage::LeaveRoom { .. } => handlers::leave_room(engine, room_id, user).await,
        ClientMessage::JoinAsSpectator { .. } => {
            engine.hub.broadcast(
                room_id,
                ServerMessage::SpectatorJoined {
                    room_id,
                    spectator: user.to_string(),
                },
            );
            Ok(())
        }
        ClientMessage::StartGame { .. } => handlers::start_game(engine, room_id, user).await,
        ClientMessage::MakeMove { row, col, .. } => {
            handlers::move_orchestrator::make_move(engine, room_id, user, row, col).await
        }
        ClientMessage::KickPlayer { target, .. } => {
            handlers::kick_player(engine, room_id, user, &target).await
        }
        ClientMessage::RequestRematch { .. } => {
            handlers::request_rematch(engine, room_id, user).await.map(|_| ())
        }
        ClientMessage::Ping => {
            engine.hub.send_to(room_id, session_id, ServerMessage::Pong);
            Ok(())
        }
    };

    if let Err(err) = result {
        engine.hub.send_to(
            room_id,
            session_id,
            ServerMessage::Error {
                message: err.wire_message(),
            },
        );
    }
}
