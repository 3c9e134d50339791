//! `JoinRoom` / `LeaveRoom`.

use crate::engine::room::RoomId;
use crate::error::{EngineError, ValidationError};
use crate::protocol::{room_snapshot, ServerMessage};
use crate::store::RoomStore;

use super::{reject, unwrap_validation, Engine};

/// Seat `user` in `room_id`. Rejects a full room, a room already in
/// progress, a duplicate join, or (for private rooms) a user who was not
/// invited.
pub async fn join_room(engine: &Engine, room_id: RoomId, user: &str) -> Result<(), EngineError> {
    let user = user.to_string();
    let user_for_closure = user.clone();
    engine
        .store
        .with_room_lock(room_id, move |room| {
            let user = user_for_closure;
            if room.has_player(&user) {
                return reject(ValidationError::AlreadyJoined);
            }
            if !matches!(room.status, crate::engine::room::RoomStatus::Waiting) {
                return reject(ValidationError::AlreadyStarted);
            }
            if room.is_full() {
                return reject(ValidationError::RoomFull);
            }
            if room.is_private && !room.invited_players.iter().any(|p| p == &user) {
                return reject(ValidationError::NotInvited);
            }
            room.players.push(user.clone());
            room.invited_players.retain(|p| p != &user);
            Ok(())
        })
        .await
        .map_err(unwrap_validation)?;

    let room = engine
        .store
        .get_room(room_id)
        .await
        .map_err(EngineError::from)?
        .ok_or(EngineError::from(ValidationError::RoomNotFound))?;

    engine.hub.broadcast(
        room_id,
        ServerMessage::PlayerJoined {
            room_id,
            player: user.to_string(),
        },
    );
    engine
        .hub
        .broadcast(room_id, ServerMessage::RoomState(room_snapshot(&room)));
    Ok(())
}

/// Remove `user` from a still-`waiting` room. Leaving an in-progress game is
/// not modeled as a command; a disconnect is handled by the Session/Hub
/// layer instead, per the specification's scope.
pub async fn leave_room(engine: &Engine, room_id: RoomId, user: &str) -> Result<(), EngineError> {
    let user = user.to_string();
    let user_for_closure = user.clone();
    engine
        .store
        .with_room_lock(room_id, move |room| {
            let user = user_for_closure;
            if !room.has_player(&user) {
                return reject(ValidationError::NotInRoom);
            }
            room.players.retain(|p| p != &user);
            Ok(())
        })
        .await
        .map_err(unwrap_validation)?;

    engine.hub.broadcast(
        room_id,
        ServerMessage::PlayerLeft {
            room_id,
            player: user,
        },
    );
    Ok(())
}
