//! Wire protocol. Unlike the teacher's `#[serde(tag = "type", content =
//! "data")]` envelope, every message here is a flat JSON object: `type` sits
//! alongside its fields, matching the original Channels consumer's
//! `{"type": "...", ...}` frames that `original_source` sends over the
//! socket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::room::{Room, RoomId, RoomStatus};

/// Commands a session may issue once authenticated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    JoinAsSpectator {
        room_id: RoomId,
    },
    StartGame {
        room_id: RoomId,
    },
    MakeMove {
        room_id: RoomId,
        row: i32,
        col: i32,
    },
    KickPlayer {
        room_id: RoomId,
        target: String,
    },
    RequestRematch {
        room_id: RoomId,
    },
    Ping,
}

/// A single occupied cell, as placed on the wire (owner + count, coordinates
/// carried by the enclosing map key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireCell {
    pub row: i32,
    pub col: i32,
    pub owner: String,
    pub count: u32,
}

pub fn board_to_wire(board: &crate::engine::board::Board) -> Vec<WireCell> {
    board
        .iter()
        .map(|(&(row, col), cell)| WireCell {
            row,
            col,
            owner: cell.owner.clone(),
            count: cell.count,
        })
        .collect()
}

/// A complete, authoritative room snapshot, sent on join/reconnect and after
/// every state-changing command settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub host: String,
    pub players: Vec<String>,
    pub eliminated_players: Vec<String>,
    pub current_turn: Option<String>,
    pub board_size: i32,
    pub board: Vec<WireCell>,
    pub move_count: u32,
    pub winner: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Build the current `RoomState` frame for a room. Shared by every handler
/// and by the Session's on-connect snapshot so the wire shape can't drift
/// between them.
pub fn room_snapshot(room: &Room) -> RoomSnapshot {
    RoomSnapshot {
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
    }
}

/// One wave of an in-progress chain reaction: the cells that exploded this
/// wave and the board state immediately after applying them. The Move
/// Orchestrator pauses between waves so clients can animate each one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplosionWave {
    pub room_id: RoomId,
    pub wave_index: u32,
    pub exploded_cells: Vec<(i32, i32)>,
    pub board: Vec<WireCell>,
}

/// Frames the server may send to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomState(RoomSnapshot),
    PlayerJoined {
        room_id: RoomId,
        player: String,
    },
    PlayerLeft {
        room_id: RoomId,
        player: String,
    },
    SpectatorJoined {
        room_id: RoomId,
        spectator: String,
    },
    GameStarted {
        room_id: RoomId,
        first_turn: String,
    },
    MovePending {
        room_id: RoomId,
        player: String,
        row: i32,
        col: i32,
    },
    ExplosionWave(ExplosionWave),
    PlayerEliminated {
        room_id: RoomId,
        player: String,
    },
    TurnChanged {
        room_id: RoomId,
        current_turn: String,
    },
    GameOver {
        room_id: RoomId,
        winner: Option<String>,
    },
    RoomDeleted {
        room_id: RoomId,
    },
    RematchReady {
        room_id: RoomId,
        rematch_room_id: RoomId,
    },
    Pong,
    Error {
        message: String,
    },
}

/// Never sent; reconstructed from a stored cookie value for documentation
/// purposes and integration tests that need to mint one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    pub expires_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
}

impl SessionClaims {
    pub fn room_tag(room_id: RoomId) -> String {
        format!("room:{}", room_id)
    }
}

/// A unique per-connection identifier, used only to key the Hub's member
/// maps — never sent on the wire.
pub type SessionId = Uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_uses_flat_type_tag() {
        let json = r#"{"type":"make_move","room_id":"00000000-0000-0000-0000-000000000000","row":1,"col":2}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::MakeMove { row: 1, col: 2, .. }
        ));
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let json = r#"{"type":"not_a_real_message"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn server_message_serializes_flat() {
        let msg = ServerMessage::Error {
            message: "not_your_turn".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "not_your_turn");
    }
}
