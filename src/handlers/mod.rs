//! Command Handlers: one function per client command, each validating
//! against a locked `Room`, persisting through the `RoomStore`, and
//! broadcasting the result through the `Hub`. Mirrors the teacher's
//! `room_service.rs` command-per-function layout.

mod join;
mod kick;
mod rematch;
mod start;

pub mod move_orchestrator;

pub use join::{join_room, leave_room};
pub use kick::kick_player;
pub use rematch::request_rematch;
pub use start::start_game;

use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::error::{EngineError, StorageError, ValidationError};
use crate::hub::Hub;
use crate::store::MemoryRoomStore;

/// Shared context every handler needs: where rooms live, who to notify, and
/// how fast the Move Orchestrator should pace animation waves.
///
/// `store` is the concrete `MemoryRoomStore`, not `Arc<dyn RoomStore>`: the
/// trait's `with_room_lock` is generic over its closure's return type, which
/// makes `RoomStore` useful as a seam for tests and future backends but not
/// object-safe. With exactly one backend shipped, there is no call for
/// dynamic dispatch here.
#[derive(Clone)]
pub struct Engine {
    pub store: Arc<MemoryRoomStore>,
    pub hub: Arc<Hub>,
    pub orchestrator: OrchestratorConfig,
}

impl Engine {
    pub fn new(store: Arc<MemoryRoomStore>, hub: Arc<Hub>, orchestrator: OrchestratorConfig) -> Self {
        Self {
            store,
            hub,
            orchestrator,
        }
    }
}

/// A `RoomStore::with_room_lock` closure reports a validation failure by
/// stuffing it into `StorageError::Backend` (the trait has no room for a
/// second error type). Unwrap that back into a proper `EngineError` so the
/// retry layer above only ever sees `Conflict` as retryable.
pub(crate) fn unwrap_validation(err: StorageError) -> EngineError {
    if let StorageError::Backend(inner) = &err {
        if let Some(v) = inner.downcast_ref::<ValidationError>() {
            return EngineError::Validation(*v);
        }
    }
    EngineError::Storage(err)
}

/// Shorthand for rejecting a `with_room_lock` closure with a validation
/// error, matching the `StorageError::Backend(anyhow)` smuggling above.
pub(crate) fn reject<T>(err: ValidationError) -> Result<T, StorageError> {
    Err(StorageError::Backend(err.into()))
}
