//! Error taxonomy for the room engine.
//!
//! Four kinds, matching the propagation policy in the specification:
//! client-visible [`ValidationError`]s, transient [`StorageError`]s (retried
//! once upstream, then surfaced as `"internal"`), silently-dropped
//! [`ProtocolError`]s, and [`SafetyError`]s that force a room to `finished`.

use thiserror::Error;

/// Rejections a Command Handler returns to the originating session only.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("not_your_turn")]
    NotYourTurn,
    #[error("not_your_cell")]
    NotYourCell,
    #[error("empty_not_allowed_after_first_round")]
    EmptyNotAllowedAfterFirstRound,
    #[error("room_full")]
    RoomFull,
    #[error("already_started")]
    AlreadyStarted,
    #[error("already_joined")]
    AlreadyJoined,
    #[error("not_invited")]
    NotInvited,
    #[error("not_host")]
    NotHost,
    #[error("too_few_players")]
    TooFewPlayers,
    #[error("self_kick")]
    SelfKick,
    #[error("room_not_found")]
    RoomNotFound,
    #[error("not_in_room")]
    NotInRoom,
    #[error("game_not_finished")]
    GameNotFinished,
    #[error("not_participant")]
    NotParticipant,
}

impl ValidationError {
    /// Stable wire identifier sent in the `error` frame's `message` field.
    pub fn as_wire_code(&self) -> &'static str {
        match self {
            Self::NotYourTurn => "not_your_turn",
            Self::NotYourCell => "not_your_cell",
            Self::EmptyNotAllowedAfterFirstRound => "empty_not_allowed_after_first_round",
            Self::RoomFull => "room_full",
            Self::AlreadyStarted => "already_started",
            Self::AlreadyJoined => "already_joined",
            Self::NotInvited => "not_invited",
            Self::NotHost => "not_host",
            Self::TooFewPlayers => "too_few_players",
            Self::SelfKick => "self_kick",
            Self::RoomNotFound => "room_not_found",
            Self::NotInRoom => "not_in_room",
            Self::GameNotFinished => "game_not_finished",
            Self::NotParticipant => "not_participant",
        }
    }
}

/// Transient persistence failure. Retried once by the store layer; if the
/// retry also fails, the caller surfaces `"internal"` to the session.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("room row is locked by a concurrent transaction")]
    Conflict,
    #[error("transaction timed out")]
    Timeout,
    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Malformed inbound frame or unknown message `type`. Never surfaced to the
/// client; logged at debug and dropped.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown message type: {0}")]
    UnknownType(String),
}

/// Safety-net failures that force a room into a terminal, winnerless state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SafetyError {
    #[error("explosion_limit_exceeded")]
    ExplosionLimitExceeded,
}

/// Top-level error returned by command handlers.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Safety(#[from] SafetyError),
}

impl EngineError {
    /// Message to place in the `error` frame sent to the originating session.
    pub fn wire_message(&self) -> String {
        match self {
            Self::Validation(v) => v.as_wire_code().to_string(),
            Self::Storage(_) => "internal".to_string(),
            Self::Safety(s) => s.to_string(),
        }
    }
}
