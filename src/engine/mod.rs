//! The pure simulation core: board rules (`board`) and the `Room` data model
//! (`room`). Nothing in this module touches the network, a clock, or a lock
//! — it is safe to call from any context, including property tests.

pub mod board;
pub mod player;
pub mod room;

pub use board::{Board, Cell, Coord};
pub use player::{PerGameStats, PlayerStats};
pub use room::{GameKind, Room, RoomStatus};
