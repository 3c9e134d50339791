//! `MakeMove`: place or reinforce a piece, then drive the resulting chain
//! reaction wave by wave, broadcasting after each wave so clients can
//! animate it. The specification's concurrency rule — never suspend while
//! holding the room lock — means this function takes the lock once per wave,
//! not once for the whole move: the `.await` points for pacing sleeps and
//! broadcasts all live between separate `with_room_lock` calls.

use crate::engine::board::{critical_cells, Board};
use crate::engine::room::{RoomId, RoomStatus};
use crate::error::{EngineError, SafetyError, ValidationError};
use crate::protocol::{board_to_wire, ExplosionWave, RoomSnapshot, ServerMessage};
use crate::store::{MemoryRoomStore, RoomStore};

use super::{reject, unwrap_validation, Engine};

/// One locked step's worth of information the orchestrator needs to decide
/// what to do next, and to broadcast, without holding the lock while it
/// does either.
struct StepOutcome {
    board: Board,
    move_count: u32,
    current_turn: Option<String>,
    eliminated_players: Vec<String>,
    status: RoomStatus,
    winner: Option<String>,
    players: Vec<String>,
    board_size: i32,
    host: String,
    finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn snapshot_message(room_id: RoomId, outcome: &StepOutcome) -> ServerMessage {
    ServerMessage::RoomState(RoomSnapshot {
        room_id,
        status: outcome.status,
        host: outcome.host.clone(),
        players: outcome.players.clone(),
        eliminated_players: outcome.eliminated_players.clone(),
        current_turn: outcome.current_turn.clone(),
        board_size: outcome.board_size,
        board: board_to_wire(&outcome.board),
        move_count: outcome.move_count,
        winner: outcome.winner.clone(),
        finished_at: outcome.finished_at,
    })
}

fn next_active_player(players: &[String], eliminated: &[String], after: &str) -> Option<String> {
    let active: Vec<&String> = players.iter().filter(|p| !eliminated.contains(p)).collect();
    if active.is_empty() {
        return None;
    }
    let pos = active.iter().position(|p| p.as_str() == after);
    let next_index = match pos {
        Some(i) => (i + 1) % active.len(),
        None => 0,
    };
    Some(active[next_index].clone())
}

/// Resolve eliminations and a possible winner against the current board,
/// mutating the room's `eliminated_players`/`status`/`winner`/`current_turn`
/// fields in place, and — the moment `status` flips to `finished` — crediting
/// every participant's durable stats in the same locked step. Called from
/// inside a locked step.
fn resolve_terminal_state(store: &MemoryRoomStore, room: &mut crate::engine::room::Room, mover: &str) {
    let newly_eliminated =
        crate::engine::board::detect_eliminated(&room.board, &room.players, room.move_count);
    for player in newly_eliminated {
        if !room.eliminated_players.iter().any(|p| p == &player) {
            room.eliminated_players.push(player);
        }
    }

    // `winner` just asks "is there a single owner left on the board" — during
    // the initial placement round most seats haven't placed a piece yet, so
    // that question is meaningless until every seat has had its first move.
    let still_placing = (room.move_count as usize) < room.players.len();
    let (finished, winner) = if still_placing {
        (false, None)
    } else {
        crate::engine::board::winner(&room.board, &room.players, mover)
    };
    if finished {
        room.status = RoomStatus::Finished;
        room.winner = winner;
        room.current_turn = None;
        room.finished_at = Some(chrono::Utc::now());
        store.update_stats_on_finish(room);
    } else if let Some(current) = room.current_turn.clone() {
        room.current_turn = next_active_player(&room.players, &room.eliminated_players, &current);
    }
}

pub async fn make_move(
    engine: &Engine,
    room_id: RoomId,
    user: &str,
    row: i32,
    col: i32,
) -> Result<(), EngineError> {
    let user_owned = user.to_string();
    let first_step = engine
        .store
        .with_room_lock(room_id, move |room| {
            if !matches!(room.status, RoomStatus::InProgress) {
                return reject(ValidationError::AlreadyStarted);
            }
            if room.current_turn.as_deref() != Some(user_owned.as_str()) {
                return reject(ValidationError::NotYourTurn);
            }

            match room.board.get(&(row, col)) {
                Some(cell) if cell.owner == user_owned => {
                    room.board.get_mut(&(row, col)).unwrap().count += 1;
                }
                Some(_) => return reject(ValidationError::NotYourCell),
                None => {
                    if !room.empty_placement_allowed() {
                        return reject(ValidationError::EmptyNotAllowedAfterFirstRound);
                    }
                    room.board.insert(
                        (row, col),
                        crate::engine::board::Cell {
                            owner: user_owned.clone(),
                            count: crate::engine::room::INITIAL_PLACEMENT_COUNT,
                        },
                    );
                }
            }
            room.move_count += 1;

            Ok(StepOutcome {
                board: room.board.clone(),
                move_count: room.move_count,
                current_turn: room.current_turn.clone(),
                eliminated_players: room.eliminated_players.clone(),
                status: room.status,
                winner: room.winner.clone(),
                players: room.players.clone(),
                board_size: room.board_size,
                host: room.host.clone(),
                finished_at: room.finished_at,
            })
        })
        .await
        .map_err(unwrap_validation)?;

    engine.hub.broadcast(
        room_id,
        ServerMessage::MovePending {
            room_id,
            player: user.to_string(),
            row,
            col,
        },
    );
    engine
        .hub
        .broadcast(room_id, snapshot_message(room_id, &first_step));

    let cap = 8 * first_step.board_size * first_step.board_size;
    let mut wave_index: u32 = 0;
    let mover = user.to_string();

    // Each wave is two locked steps with broadcasts and a sleep on either
    // side, never a sleep while the lock is held: read the criticals and
    // broadcast them against the pre-explosion board (clients animate the
    // highlighted cells about to go off), sleep, apply the explosion in its
    // own transaction, broadcast the settled board, sleep, repeat.
    loop {
        let (criticals, pre_board) = engine
            .store
            .with_room_lock(room_id, |room| {
                Ok((critical_cells(&room.board), room.board.clone()))
            })
            .await
            .map_err(unwrap_validation)?;

        if criticals.is_empty() {
            break;
        }

        engine.hub.broadcast(
            room_id,
            ServerMessage::ExplosionWave(ExplosionWave {
                room_id,
                wave_index,
                exploded_cells: criticals.clone(),
                board: board_to_wire(&pre_board),
            }),
        );
        tokio::time::sleep(engine.orchestrator.wave_pending_delay()).await;

        let post_board = engine
            .store
            .with_room_lock(room_id, move |room| {
                crate::engine::board::apply_wave(&mut room.board, &criticals, room.board_size);
                Ok(room.board.clone())
            })
            .await
            .map_err(unwrap_validation)?;

        engine.hub.broadcast(
            room_id,
            ServerMessage::ExplosionWave(ExplosionWave {
                room_id,
                wave_index,
                exploded_cells: Vec::new(),
                board: board_to_wire(&post_board),
            }),
        );

        wave_index += 1;
        if wave_index as i32 > cap {
            engine
                .store
                .with_room_lock(room_id, |room| {
                    room.status = RoomStatus::Finished;
                    room.winner = None;
                    room.current_turn = None;
                    room.finished_at = Some(chrono::Utc::now());
                    Ok(())
                })
                .await
                .map_err(unwrap_validation)?;
            let err: EngineError = SafetyError::ExplosionLimitExceeded.into();
            engine.hub.broadcast(
                room_id,
                ServerMessage::GameOver {
                    room_id,
                    winner: None,
                },
            );
            return Err(err);
        }

        tokio::time::sleep(engine.orchestrator.wave_post_delay()).await;
    }

    // Resolution: the wave loop found no more criticals on a settled board.
    let store_for_resolution = &*engine.store;
    let final_outcome = engine
        .store
        .with_room_lock(room_id, move |room| {
            resolve_terminal_state(store_for_resolution, room, &mover);
            Ok(StepOutcome {
                board: room.board.clone(),
                move_count: room.move_count,
                current_turn: room.current_turn.clone(),
                eliminated_players: room.eliminated_players.clone(),
                status: room.status,
                winner: room.winner.clone(),
                players: room.players.clone(),
                board_size: room.board_size,
                host: room.host.clone(),
                finished_at: room.finished_at,
            })
        })
        .await
        .map_err(unwrap_validation)?;

    engine
        .hub
        .broadcast(room_id, snapshot_message(room_id, &final_outcome));
    if matches!(final_outcome.status, RoomStatus::Finished) {
        broadcast_eliminations_and_outcome(engine, room_id, &final_outcome);
    } else if let Some(turn) = final_outcome.current_turn.clone() {
        engine.hub.broadcast(
            room_id,
            ServerMessage::TurnChanged {
                room_id,
                current_turn: turn,
            },
        );
    }
    Ok(())
}

fn broadcast_eliminations_and_outcome(engine: &Engine, room_id: RoomId, outcome: &StepOutcome) {
    for player in &outcome.eliminated_players {
        engine.hub.broadcast(
            room_id,
            ServerMessage::PlayerEliminated {
                room_id,
                player: player.clone(),
            },
        );
    }
    engine.hub.broadcast(
        room_id,
        ServerMessage::GameOver {
            room_id,
            winner: outcome.winner.clone(),
        },
    );
}
