//! `RequestRematch`: create a new, always-private `waiting` room seeded from
//! a finished one's game kind, inviting its other participants. Idempotent
//! per requester — a second request from the same participant for the same
//! finished room returns the rematch already pending instead of spawning a
//! duplicate, matching the specification's idempotency note.

use uuid::Uuid;

use crate::engine::room::{Room, RoomId, RoomStatus};
use crate::error::{EngineError, ValidationError};
use crate::protocol::ServerMessage;
use crate::store::RoomStore;

use super::Engine;

pub async fn request_rematch(
    engine: &Engine,
    parent_id: RoomId,
    user: &str,
) -> Result<RoomId, EngineError> {
    if let Some(pending) = engine.store.find_pending_rematch(parent_id, user).await? {
        return Ok(pending.id);
    }

    let parent = engine
        .store
        .get_room(parent_id)
        .await?
        .ok_or(EngineError::from(ValidationError::RoomNotFound))?;

    if !matches!(parent.status, RoomStatus::Finished) {
        return Err(ValidationError::GameNotFinished.into());
    }
    let was_participant = parent.players.iter().any(|p| p == user)
        || parent.eliminated_players.iter().any(|p| p == user);
    if !was_participant {
        return Err(ValidationError::NotParticipant.into());
    }

    let invited: Vec<String> = parent
        .players
        .iter()
        .chain(parent.eliminated_players.iter())
        .filter(|p| p.as_str() != user)
        .cloned()
        .collect();

    let new_id = Uuid::new_v4();
    let mut rematch = Room::new(
        new_id,
        parent.game_kind.clone(),
        user.to_string(),
        true,
        invited,
        chrono::Utc::now(),
    );
    rematch.rematch_parent = Some(parent_id);
    rematch.board_size = parent.board_size;
    engine.store.create_room(rematch).await?;

    engine.hub.broadcast(
        parent_id,
        ServerMessage::RematchReady {
            room_id: parent_id,
            rematch_room_id: new_id,
        },
    );
    Ok(new_id)
}
