//! Fan-out registry: one outbound channel per connected session, grouped by
//! room. Grounded on the teacher's `ConnectionManager` (`DashMap` of
//! sessions) split across a per-room view, the way `server/room_service.rs`
//! layers room membership over the flat connection table.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::room::RoomId;
use crate::protocol::{ServerMessage, SessionId};

const SESSION_CHANNEL_CAPACITY: usize = 64;

/// The sending half registered for one live WebSocket connection.
#[derive(Clone)]
pub struct SessionHandle {
    pub sender: mpsc::Sender<Arc<ServerMessage>>,
}

#[derive(Default)]
pub struct Hub {
    rooms: DashMap<RoomId, DashMap<SessionId, SessionHandle>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Register a session in a room and return the receiving half of its
    /// channel. Call once per accepted WebSocket connection.
    pub fn register(
        &self,
        room_id: RoomId,
        session_id: SessionId,
    ) -> mpsc::Receiver<Arc<ServerMessage>> {
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        self.rooms
            .entry(room_id)
            .or_default()
            .insert(session_id, SessionHandle { sender: tx });
        rx
    }

    pub fn unregister(&self, room_id: RoomId, session_id: SessionId) {
        if let Some(members) = self.rooms.get(&room_id) {
            members.remove(&session_id);
        }
    }

    /// Deliver `message` to every session in `room_id`, in the iteration
    /// order of the current member snapshot. Delivery is best-effort and
    /// non-blocking: a full or closed channel evicts that session instead of
    /// stalling the rest of the room.
    pub fn broadcast(&self, room_id: RoomId, message: ServerMessage) {
        let Some(members) = self.rooms.get(&room_id) else {
            return;
        };
        let message = Arc::new(message);
        let mut dead = Vec::new();
        for entry in members.iter() {
            if let Err(err) = entry.value().sender.try_send(message.clone()) {
                debug!(room_id = %room_id, session_id = %entry.key(), error = %err, "dropping dead session");
                dead.push(*entry.key());
            }
        }
        drop(members);
        if !dead.is_empty() {
            if let Some(members) = self.rooms.get(&room_id) {
                for id in dead {
                    members.remove(&id);
                }
            }
        }
    }

    /// Deliver `message` to a single session, regardless of room. Used for
    /// error frames addressed only to the command's originator.
    pub fn send_to(&self, room_id: RoomId, session_id: SessionId, message: ServerMessage) {
        if let Some(members) = self.rooms.get(&room_id) {
            if let Some(handle) = members.get(&session_id) {
                let _ = handle.sender.try_send(Arc::new(message));
            }
        }
    }

    pub fn member_count(&self, room_id: RoomId) -> usize {
        self.rooms.get(&room_id).map(|m| m.len()).unwrap_or(0)
    }

    pub fn drop_room(&self, room_id: RoomId) {
        self.rooms.remove(&room_id);
    }
}
