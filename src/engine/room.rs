//! The `Room` aggregate: everything about one game instance, mirroring the
//! original `GameSession` model (`players`, `board_state`, `status`,
//! `move_count`, `eliminated_players`, `rematch_parent`, ...). A `Room` is
//! always accessed through a single `RoomStore`-held lock; nothing here
//! enforces that itself — see `crate::store`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::board::Board;

pub type RoomId = Uuid;

/// The number of pieces placed on an empty cell during a player's first move
/// of the game. After every player has made one move, placing on an empty
/// cell is no longer allowed — only reinforcing an owned cell is.
pub const INITIAL_PLACEMENT_COUNT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Finished,
}

/// The game being played in a room, identified by a stable slug (mirrors
/// `MiniGame.slug`) with the player-count bounds that gate `JoinRoom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameKind {
    pub slug: String,
    pub name: String,
    pub min_players: u32,
    pub max_players: u32,
}

impl GameKind {
    /// The classic DiceWars variant: 2 to 7 players.
    pub fn dicewars() -> Self {
        Self {
            slug: "dicewars".to_string(),
            name: "DiceWars".to_string(),
            min_players: 2,
            max_players: 7,
        }
    }
}

/// Board side length for a given seat count: 5x5 up to 2 players, 6x6 for 3,
/// 7x7 for 4 or more. Resolved from the original `create_game` view. Called
/// with `room.players.len()` at `StartGame` time (I3), not with
/// `game_kind.max_players`, which is a constant per game type and says
/// nothing about how many seats actually filled.
pub fn board_size_for(seat_count: u32) -> i32 {
    match seat_count {
        0..=2 => 5,
        3 => 6,
        _ => 7,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub game_kind: GameKind,
    pub host: String,
    pub players: Vec<String>,
    pub is_private: bool,
    pub invited_players: Vec<String>,
    pub status: RoomStatus,
    pub board: Board,
    pub board_size: i32,
    pub current_turn: Option<String>,
    pub move_count: u32,
    pub eliminated_players: Vec<String>,
    pub winner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub rematch_parent: Option<RoomId>,
}

impl Room {
    /// A brand-new `waiting` room with only its host seated. `board_size` is
    /// only a provisional value here, shown to clients while the lobby fills
    /// — `StartGame` recomputes it from the seated player count and freezes
    /// it for the room's lifetime (I3).
    pub fn new(
        id: RoomId,
        game_kind: GameKind,
        host: String,
        is_private: bool,
        invited_players: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let board_size = board_size_for(game_kind.max_players);
        Self {
            id,
            game_kind,
            host: host.clone(),
            players: vec![host],
            is_private,
            invited_players,
            status: RoomStatus::Waiting,
            board: Board::new(),
            board_size,
            current_turn: None,
            move_count: 0,
            eliminated_players: Vec::new(),
            winner: None,
            created_at,
            finished_at: None,
            rematch_parent: None,
        }
    }

    pub fn is_host(&self, user: &str) -> bool {
        self.host == user
    }

    pub fn has_player(&self, user: &str) -> bool {
        self.players.iter().any(|p| p == user)
    }

    pub fn is_active_player(&self, user: &str) -> bool {
        self.has_player(user) && !self.eliminated_players.iter().any(|p| p == user)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() as u32 >= self.game_kind.max_players
    }

    /// Players may still place on an empty cell during their very first move
    /// of the game; once every seat has moved at least once, only
    /// reinforcing an owned cell is legal. Resolves the specification's
    /// "initial placement" Open Question at `INITIAL_PLACEMENT_COUNT = 3`,
    /// not the older single-piece rule the original implementation used.
    pub fn empty_placement_allowed(&self) -> bool {
        (self.move_count as usize) < self.players.len()
    }

    pub fn active_player_count(&self) -> usize {
        self.players.len() - self.eliminated_players.len()
    }
}
