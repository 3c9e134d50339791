//! Pure board rules: neighbor enumeration, critical-cell detection, a single
//! explosion step, piece counting, elimination detection, and winner
//! resolution. No I/O, no locks — every function here is a plain
//! transformation over a board, safe to fuzz and to call from any thread.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A board coordinate, row-major.
pub type Coord = (i32, i32);

/// A single occupied board cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub owner: String,
    pub count: u32,
}

/// Sparse board: absent key == empty cell. `BTreeMap` gives deterministic
/// iteration order, which keeps `critical_cells` output stable for tests even
/// though the orchestrator only depends on it as a set.
pub type Board = BTreeMap<Coord, Cell>;

/// The 4-connected von-Neumann neighbors of `(r, c)` within `[0, n)^2`, in
/// the fixed tie-break order up, down, left, right.
pub fn neighbors(r: i32, c: i32, n: i32) -> Vec<Coord> {
    [(r - 1, c), (r + 1, c), (r, c - 1), (r, c + 1)]
        .into_iter()
        .filter(|&(nr, nc)| nr >= 0 && nr < n && nc >= 0 && nc < n)
        .collect()
}

/// Cells with `count >= 4`. The *set* is deterministic; order is incidental
/// (BTreeMap row-major) and not relied on by callers.
pub fn critical_cells(board: &Board) -> Vec<Coord> {
    board
        .iter()
        .filter(|(_, cell)| cell.count >= 4)
        .map(|(&coord, _)| coord)
        .collect()
}

/// Explode the cell at `(r, c)`, attributed to `attacker`:
/// - decrement its count by 4; if the result is `<= 0`, remove the cell;
/// - for each valid neighbor, create `{owner: attacker, count: 1}` if absent,
///   else increment its count by 1 and reassign ownership to `attacker`
///   (captures enemy cells).
///
/// Commutative-with-accumulation: within one wave, every critical cell loses
/// exactly 4 and every neighbor gains +1 per critical neighbor, all under the
/// same `attacker`, so applying a wave's cells in any order yields the same
/// final board (see `P3` in the specification's testable properties).
pub fn explode(board: &mut Board, r: i32, c: i32, attacker: &str, n: i32) {
    let remaining = match board.get_mut(&(r, c)) {
        Some(cell) => {
            cell.count = cell.count.saturating_sub(4);
            cell.count
        }
        None => return,
    };

    if remaining == 0 {
        board.remove(&(r, c));
    }

    for (nr, nc) in neighbors(r, c, n) {
        board
            .entry((nr, nc))
            .and_modify(|cell| {
                cell.count += 1;
                cell.owner = attacker.to_string();
            })
            .or_insert_with(|| Cell {
                owner: attacker.to_string(),
                count: 1,
            });
    }
}

/// Explode every cell in `criticals` as one wave. Attackers are fixed from
/// the board state *before* any of this wave's explosions run, so a capture
/// by one critical cell never changes which player another critical cell in
/// the same wave is attributed to — the property that makes a wave
/// commutative (see `P3`).
pub fn apply_wave(board: &mut Board, criticals: &[Coord], n: i32) {
    let attackers: Vec<String> = criticals
        .iter()
        .map(|&(r, c)| board[&(r, c)].owner.clone())
        .collect();
    for (&(r, c), attacker) in criticals.iter().zip(&attackers) {
        explode(board, r, c, attacker, n);
    }
}

/// Number of cells owned by `player`.
pub fn count_pieces(board: &Board, player: &str) -> usize {
    board.values().filter(|cell| cell.owner == player).count()
}

/// Players with zero cells on the board, but only once every player has had
/// at least one initial placement (`move_count >= players.len()`). Before
/// that threshold this always returns empty — a player who simply hasn't
/// moved yet is not "eliminated".
pub fn detect_eliminated(board: &Board, players: &[String], move_count: u32) -> Vec<String> {
    if (move_count as usize) < players.len() {
        return Vec::new();
    }
    players
        .iter()
        .filter(|p| count_pieces(board, p) == 0)
        .cloned()
        .collect()
}

/// Terminal-state resolution: `(status, winner)`.
///
/// If at most one distinct owner remains on the board and there is more than
/// one player in the game, the game is `finished`; the winner is the sole
/// remaining owner, or `fallback` (the player who just moved) if the board
/// is completely empty.
pub fn winner(
    board: &Board,
    players: &[String],
    fallback: &str,
) -> (bool /* finished */, Option<String>) {
    if players.len() <= 1 {
        return (false, None);
    }

    let mut owners: Vec<&str> = board.values().map(|c| c.owner.as_str()).collect();
    owners.sort_unstable();
    owners.dedup();

    match owners.len() {
        0 => (true, Some(fallback.to_string())),
        1 => (true, Some(owners[0].to_string())),
        _ => (false, None),
    }
}
