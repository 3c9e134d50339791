//! In-memory `RoomStore`, the only backend this crate ships. A production
//! deployment would add a SQL-backed implementation behind the same trait;
//! the room engine itself is storage-agnostic.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::engine::player::PlayerStats;
use crate::engine::room::{Room, RoomId, RoomStatus};
use crate::error::StorageError;
use crate::retry::{with_retry, RetryConfig};

use super::{CleanupOutcome, RoomStore};

/// Each room's `tokio::sync::Mutex` *is* the row-level lock the
/// specification describes: held only across a synchronous mutation, never
/// across an `.await`.
pub struct MemoryRoomStore {
    rooms: DashMap<RoomId, Mutex<Room>>,
    players: DashMap<String, PlayerStats>,
    retry: RetryConfig,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            players: DashMap::new(),
            retry: RetryConfig::storage(),
        }
    }

    /// A store whose retries have no delay, for tests.
    pub fn new_for_tests() -> Self {
        Self {
            rooms: DashMap::new(),
            players: DashMap::new(),
            retry: RetryConfig::immediate(),
        }
    }

    /// Current standing for one player, or the zero value if they've never
    /// finished a game. Read-only; there is no write path besides
    /// `update_stats_on_finish`.
    pub fn player_stats(&self, username: &str) -> PlayerStats {
        self.players
            .get(username)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Apply `room`'s outcome to every participant's durable stats. Called
    /// once, synchronously, from inside the same locked step that flips
    /// `room.status` to `finished` — the per-player `DashMap::entry` lock is
    /// the "same transaction" the specification asks for, since nothing else
    /// ever mutates `players`. Guarded against double-counting: a caller that
    /// re-enters this on an already-settled room is a bug elsewhere (I5
    /// forbids further mutation of a finished room), but the guard keeps that
    /// bug from corrupting stats too.
    pub fn update_stats_on_finish(&self, room: &Room) {
        if !matches!(room.status, RoomStatus::Finished) {
            return;
        }

        let mut participants: Vec<&String> =
            room.players.iter().chain(room.eliminated_players.iter()).collect();
        participants.sort();
        participants.dedup();

        for player in participants {
            let won = room.winner.as_deref() == Some(player.as_str());
            self.players
                .entry(player.clone())
                .or_default()
                .apply_finish(&room.game_kind.slug, room.players.len() as u32, won);
        }
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn create_room(&self, room: Room) -> Result<(), StorageError> {
        if self.rooms.contains_key(&room.id) {
            return Err(StorageError::Conflict);
        }
        self.rooms.insert(room.id, Mutex::new(room));
        Ok(())
    }

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>, StorageError> {
        match self.rooms.get(&id) {
            Some(entry) => Ok(Some(entry.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn with_room_lock<F, T>(&self, id: RoomId, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Room) -> Result<T, StorageError> + Send,
        T: Send,
    {
        let mut f = Some(f);
        with_retry(self.retry, || {
            let f = f.take().expect("with_room_lock retried more than once");
            async {
                let entry = self.rooms.get(&id).ok_or(StorageError::Conflict)?;
                let mut room = entry.lock().await;
                f(&mut room)
            }
        })
        .await
    }

    async fn delete_stale_waiting(
        &self,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Result<CleanupOutcome, StorageError> {
        let mut stale = Vec::new();
        for entry in self.rooms.iter() {
            let room = entry.value().lock().await;
            if room.status == RoomStatus::Waiting && now - room.created_at > max_age {
                stale.push(*entry.key());
            }
        }
        for id in &stale {
            self.rooms.remove(id);
        }
        Ok(CleanupOutcome {
            rooms_removed: stale.len(),
            room_ids: stale,
        })
    }

    async fn find_pending_rematch(
        &self,
        parent: RoomId,
        host: &str,
    ) -> Result<Option<Room>, StorageError> {
        for entry in self.rooms.iter() {
            let room = entry.value().lock().await;
            if room.status == RoomStatus::Waiting
                && room.rematch_parent == Some(parent)
                && room.host == host
            {
                return Ok(Some(room.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::room::GameKind;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn sample_room(id: RoomId, created_at: DateTime<Utc>) -> Room {
        Room::new(
            id,
            GameKind::dicewars(),
            "alice".to_string(),
            false,
            Vec::new(),
            created_at,
        )
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemoryRoomStore::new_for_tests();
        let id = Uuid::new_v4();
        store.create_room(sample_room(id, Utc::now())).await.unwrap();

        let fetched = store.get_room(id).await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.host, "alice");
    }

    #[tokio::test]
    async fn creating_a_duplicate_id_conflicts() {
        let store = MemoryRoomStore::new_for_tests();
        let id = Uuid::new_v4();
        store.create_room(sample_room(id, Utc::now())).await.unwrap();

        let err = store
            .create_room(sample_room(id, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn with_room_lock_mutates_and_persists() {
        let store = MemoryRoomStore::new_for_tests();
        let id = Uuid::new_v4();
        store.create_room(sample_room(id, Utc::now())).await.unwrap();

        store
            .with_room_lock(id, |room| {
                room.move_count += 1;
                Ok(())
            })
            .await
            .unwrap();

        let fetched = store.get_room(id).await.unwrap().unwrap();
        assert_eq!(fetched.move_count, 1);
    }

    #[tokio::test]
    async fn with_room_lock_on_missing_room_surfaces_after_one_retry() {
        let store = MemoryRoomStore::new_for_tests();
        let result = store
            .with_room_lock(Uuid::new_v4(), |_room: &mut Room| Ok(()))
            .await;
        assert!(matches!(result, Err(StorageError::Conflict)));
    }

    #[tokio::test]
    async fn delete_stale_waiting_removes_old_waiting_rooms_only() {
        let store = MemoryRoomStore::new_for_tests();
        let now = Utc::now();

        let stale_id = Uuid::new_v4();
        store
            .create_room(sample_room(stale_id, now - Duration::hours(2)))
            .await
            .unwrap();

        let fresh_id = Uuid::new_v4();
        store
            .create_room(sample_room(fresh_id, now))
            .await
            .unwrap();

        let in_progress_id = Uuid::new_v4();
        let mut in_progress = sample_room(in_progress_id, now - Duration::hours(2));
        in_progress.status = RoomStatus::InProgress;
        store.create_room(in_progress).await.unwrap();

        let outcome = store
            .delete_stale_waiting(now, Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(outcome.rooms_removed, 1);
        assert!(store.get_room(stale_id).await.unwrap().is_none());
        assert!(store.get_room(fresh_id).await.unwrap().is_some());
        assert!(store.get_room(in_progress_id).await.unwrap().is_some());
    }

    #[test]
    fn update_stats_on_finish_credits_the_winner_and_debits_the_rest() {
        let store = MemoryRoomStore::new_for_tests();
        let mut room = sample_room(Uuid::new_v4(), Utc::now());
        room.players = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
        room.eliminated_players = vec!["bob".to_string(), "carol".to_string()];
        room.status = RoomStatus::Finished;
        room.winner = Some("alice".to_string());

        store.update_stats_on_finish(&room);

        let alice = store.player_stats("alice");
        assert_eq!(alice.total_games, 1);
        assert_eq!(alice.total_wins, 1);
        assert_eq!(alice.rank_point, 30);

        let bob = store.player_stats("bob");
        assert_eq!(bob.total_losses, 1);
        assert_eq!(bob.rank_point, 5);
    }

    #[test]
    fn update_stats_on_finish_is_a_no_op_on_an_unfinished_room() {
        let store = MemoryRoomStore::new_for_tests();
        let room = sample_room(Uuid::new_v4(), Utc::now());

        store.update_stats_on_finish(&room);

        assert_eq!(store.player_stats("alice"), PlayerStats::default());
    }

    #[test]
    fn a_winnerless_finish_debits_every_participant() {
        let store = MemoryRoomStore::new_for_tests();
        let mut room = sample_room(Uuid::new_v4(), Utc::now());
        room.players = vec!["alice".to_string(), "bob".to_string()];
        room.status = RoomStatus::Finished;
        room.winner = None;

        store.update_stats_on_finish(&room);

        assert_eq!(store.player_stats("alice").total_wins, 0);
        assert_eq!(store.player_stats("alice").total_losses, 1);
        assert_eq!(store.player_stats("bob").total_losses, 1);
    }

    proptest! {
        // P5: total-games conservation and the win/loss split hold for any
        // seat count and any choice of winner (including no winner at all).
        #[test]
        fn stats_conserve_games_and_split_wins_from_losses(
            seat_count in 2usize..8,
            winner_index in proptest::option::of(0usize..7),
        ) {
            let store = MemoryRoomStore::new_for_tests();
            let mut room = sample_room(Uuid::new_v4(), Utc::now());
            room.players = (0..seat_count).map(|i| format!("p{i}")).collect();
            room.status = RoomStatus::Finished;
            room.winner = winner_index
                .filter(|i| *i < seat_count)
                .map(|i| format!("p{i}"));

            store.update_stats_on_finish(&room);

            let mut total_wins = 0;
            let mut total_losses = 0;
            let mut total_games = 0;
            for player in &room.players {
                let stats = store.player_stats(player);
                total_games += stats.total_games;
                total_wins += stats.total_wins;
                total_losses += stats.total_losses;
            }

            prop_assert_eq!(total_games as usize, room.players.len());
            prop_assert_eq!(total_wins, if room.winner.is_some() { 1 } else { 0 });
            prop_assert_eq!(total_losses as usize, room.players.len() - total_wins as usize);
        }
    }
}
