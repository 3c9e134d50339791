//! Periodic stale-room sweep, and the one-shot routine the
//! `cleanup-stale-games` CLI subcommand reuses so the background task and
//! the admin command never disagree about what "stale" means. Grounded on
//! the teacher's `cleanup_task` in `server/maintenance.rs`.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::{info, warn};

use crate::hub::Hub;
use crate::protocol::ServerMessage;
use crate::store::{MemoryRoomStore, RoomStore};

/// Delete every `waiting` room older than `max_age`. Used directly by the
/// admin command, which runs as a one-shot separate process with no live
/// sessions to notify.
///
/// Takes the concrete store rather than `dyn RoomStore`: `with_room_lock`
/// is generic over its closure, which makes the trait unfit for dynamic
/// dispatch, and this crate only ever runs one backend anyway.
pub async fn sweep_once(
    store: &MemoryRoomStore,
    max_age: Duration,
) -> Result<usize, crate::error::StorageError> {
    let outcome = store.delete_stale_waiting(chrono::Utc::now(), max_age).await?;
    if outcome.rooms_removed > 0 {
        info!(rooms_removed = outcome.rooms_removed, "removed stale waiting rooms");
    }
    Ok(outcome.rooms_removed)
}

/// One sweep pass that also notifies the Hub, shared by `run`'s interval
/// loop and its own tests.
async fn sweep_and_notify(store: &MemoryRoomStore, hub: &Hub, max_age: Duration) {
    match store.delete_stale_waiting(chrono::Utc::now(), max_age).await {
        Ok(outcome) => {
            if outcome.rooms_removed > 0 {
                info!(rooms_removed = outcome.rooms_removed, "removed stale waiting rooms");
            }
            for room_id in outcome.room_ids {
                hub.broadcast(room_id, ServerMessage::RoomDeleted { room_id });
                hub.drop_room(room_id);
            }
        }
        Err(err) => warn!(error = %err, "janitor sweep failed"),
    }
}

/// Runs the sweep on a fixed interval until the process exits, telling any
/// session still connected to a swept room that it's gone. Spawned once at
/// startup alongside the WebSocket server.
pub async fn run(store: Arc<MemoryRoomStore>, hub: Arc<Hub>, interval: StdDuration, max_age: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        sweep_and_notify(&store, &hub, max_age).await;
    }
}
