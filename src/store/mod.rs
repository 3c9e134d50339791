//! Persistence seam for rooms: a single async trait with one in-memory
//! implementation. Mirrors the teacher's `GameDatabase` trait shape
//! (`database/mod.rs`) but scoped to what the room engine actually needs:
//! room CRUD, a locked read-modify-write primitive, and the periodic
//! stale-room sweep the Janitor drives.
//!
//! `with_room_lock` is generic over its closure, so `RoomStore` is not
//! object-safe (`dyn RoomStore` won't compile). Every caller holds the
//! concrete `MemoryRoomStore` instead of a trait object — the crate ships
//! exactly one backend, so nothing is lost by skipping dynamic dispatch.

mod memory;

pub use memory::MemoryRoomStore;

use async_trait::async_trait;

use crate::engine::room::{Room, RoomId};
use crate::error::StorageError;

/// Outcome of one Janitor sweep, surfaced to both the periodic task and the
/// `cleanup-stale-games` CLI subcommand so their logs agree on vocabulary.
/// The periodic task additionally uses `room_ids` to tell any still-connected
/// sessions their room is gone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub rooms_removed: usize,
    pub room_ids: Vec<RoomId>,
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Insert a brand-new room. Fails with `StorageError::Conflict` if the
    /// id already exists (practically unreachable with UUIDv4 ids, but kept
    /// so callers have a uniform retry path).
    async fn create_room(&self, room: Room) -> Result<(), StorageError>;

    /// Snapshot a room by id without holding any lock past the call.
    async fn get_room(&self, id: RoomId) -> Result<Option<Room>, StorageError>;

    /// Acquire the room's row lock, run `f` against a mutable reference, and
    /// persist the result iff `f` returns `Ok`. No `.await` may occur inside
    /// `f` — see the specification's concurrency model: the lock is held for
    /// the duration of a synchronous mutation only.
    async fn with_room_lock<F, T>(&self, id: RoomId, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Room) -> Result<T, StorageError> + Send,
        T: Send;

    /// All rooms still `waiting` and older than `max_age` from `now`,
    /// removed in one pass. Used by both the periodic Janitor task and the
    /// `cleanup-stale-games` admin command.
    async fn delete_stale_waiting(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        max_age: chrono::Duration,
    ) -> Result<CleanupOutcome, StorageError>;

    /// Find a `waiting` room created as a rematch of `parent` by `host`, for
    /// `RequestRematch` idempotency.
    async fn find_pending_rematch(
        &self,
        parent: RoomId,
        host: &str,
    ) -> Result<Option<Room>, StorageError>;
}
