//! `StartGame`.

use rand::RngExt;

use crate::engine::room::{board_size_for, RoomId, RoomStatus};
use crate::error::{EngineError, ValidationError};
use crate::protocol::{board_to_wire, RoomSnapshot, ServerMessage};
use crate::store::RoomStore;

use super::{reject, unwrap_validation, Engine};

/// Only the host may start a game, and only once at least
/// `game_kind.min_players` have joined. The first turn is chosen uniformly
/// at random among the seated players, per the specification — the original
/// always handed the first move to the host, but the specification
/// overrides that deterministic order explicitly. `board_size` is resolved
/// here, from the seat count at this exact moment, and frozen for the rest
/// of the room's life (I3).
pub async fn start_game(engine: &Engine, room_id: RoomId, user: &str) -> Result<(), EngineError> {
    let user = user.to_string();
    engine
        .store
        .with_room_lock(room_id, move |room| {
            if !room.is_host(&user) {
                return reject(ValidationError::NotHost);
            }
            if !matches!(room.status, RoomStatus::Waiting) {
                return reject(ValidationError::AlreadyStarted);
            }
            if (room.players.len() as u32) < room.game_kind.min_players {
                return reject(ValidationError::TooFewPlayers);
            }
            room.status = RoomStatus::InProgress;
            room.board_size = board_size_for(room.players.len() as u32);
            let mut rng = rand::rng();
            let starter_index = rng.random_range(0..room.players.len());
            room.current_turn = Some(room.players[starter_index].clone());
            Ok(())
        })
        .await
        .map_err(unwrap_validation)?;

    let room = engine
        .store
        .get_room(room_id)
        .await?
        .ok_or(EngineError::from(ValidationError::RoomNotFound))?;

    engine.hub.broadcast(
        room_id,
        ServerMessage::GameStarted {
            room_id,
            first_turn: room.current_turn.clone().expect("just set above"),
        },
    );
    engine.hub.broadcast(
        room_id,
        ServerMessage::RoomState(RoomSnapshot {
            room_id: room.id,
            status: room.status,
            host: room.host.clone(),
            players: room.players.clone(),
            eliminated_players: room.eliminated_players.clone(),
            current_turn: room.current_turn.clone(),
            board_size: room.board_size,
            board: board_to_wire(&room.board),
            move_count: room.move_count,
            winner: room.winner.clone(),
            finished_at: room.finished_at,
        }),
    );
    Ok(())
}
