//! `KickPlayer`, host-only and only while the room is still `waiting` — once
//! a game is in progress, removing a seat would break turn order, so the
//! specification scopes this to the lobby.

use crate::engine::room::{RoomId, RoomStatus};
use crate::error::{EngineError, ValidationError};
use crate::protocol::ServerMessage;
use crate::store::RoomStore;

use super::{reject, unwrap_validation, Engine};

pub async fn kick_player(
    engine: &Engine,
    room_id: RoomId,
    host: &str,
    target: &str,
) -> Result<(), EngineError> {
    if host == target {
        return Err(ValidationError::SelfKick.into());
    }

    let host = host.to_string();
    let target = target.to_string();
    let target_for_closure = target.clone();
    engine
        .store
        .with_room_lock(room_id, move |room| {
            let target = target_for_closure;
            if !room.is_host(&host) {
                return reject(ValidationError::NotHost);
            }
            if !matches!(room.status, RoomStatus::Waiting) {
                return reject(ValidationError::AlreadyStarted);
            }
            if !room.has_player(&target) {
                return reject(ValidationError::NotInRoom);
            }
            room.players.retain(|p| p != &target);
            Ok(())
        })
        .await
        .map_err(unwrap_validation)?;

    engine.hub.broadcast(
        room_id,
        ServerMessage::PlayerLeft {
            room_id,
            player: target,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::engine::room::{GameKind, Room};
    use crate::hub::Hub;
    use crate::store::MemoryRoomStore;
    use std::sync::Arc;
    use uuid::Uuid;

    fn engine() -> Engine {
        Engine::new(
            Arc::new(MemoryRoomStore::new_for_tests()),
            Arc::new(Hub::new()),
            OrchestratorConfig::zero(),
        )
    }

    #[tokio::test]
    async fn the_host_can_kick_a_waiting_player() {
        let engine = engine();
        let id = Uuid::new_v4();
        let mut room = Room::new(
            id,
            GameKind::dicewars(),
            "host".to_string(),
            false,
            vec![],
            chrono::Utc::now(),
        );
        room.players.push("alice".to_string());
        engine.store.create_room(room).await.unwrap();

        kick_player(&engine, id, "host", "alice").await.unwrap();

        let room = engine.store.get_room(id).await.unwrap().unwrap();
        assert_eq!(room.players, vec!["host".to_string()]);
    }

    #[tokio::test]
    async fn a_host_cannot_kick_themself() {
        let engine = engine();
        let id = Uuid::new_v4();
        let room = Room::new(
            id,
            GameKind::dicewars(),
            "host".to_string(),
            false,
            vec![],
            chrono::Utc::now(),
        );
        engine.store.create_room(room).await.unwrap();

        let err = kick_player(&engine, id, "host", "host").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::SelfKick)
        ));
    }

    #[tokio::test]
    async fn a_non_host_cannot_kick() {
        let engine = engine();
        let id = Uuid::new_v4();
        let mut room = Room::new(
            id,
            GameKind::dicewars(),
            "host".to_string(),
            false,
            vec![],
            chrono::Utc::now(),
        );
        room.players.push("alice".to_string());
        room.players.push("bob".to_string());
        engine.store.create_room(room).await.unwrap();

        let err = kick_player(&engine, id, "alice", "bob").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::NotHost)
        ));
    }
}
