//! The external `Player` entity: durable per-player/per-game statistics
//! updated exactly once, by `UpdateStatsOnFinish`, when a room finishes.
//! Mirrors `original_source/main/models.py`'s `CustomUser.rank_point`, with
//! the per-game breakdown the specification adds on top.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Rank points awarded to the winner of a finished game, scaled by seat
/// count: `10 * |players|`.
pub const WINNER_RANK_POINTS_PER_SEAT: u32 = 10;

/// Rank points awarded to every non-winning participant of a finished game.
pub const LOSER_RANK_POINTS: u32 = 5;

/// This player's record within one `GameKind`, keyed by `GameKind::slug`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerGameStats {
    pub rank_point: u32,
    pub wins: u32,
    pub losses: u32,
    pub games: u32,
}

/// A player's standing across every game kind they've played, plus the
/// account-wide totals shown on a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub rank_point: u32,
    pub total_games: u32,
    pub total_wins: u32,
    pub total_losses: u32,
    pub per_game_stats: BTreeMap<String, PerGameStats>,
}

impl PlayerStats {
    /// Apply one finished game's outcome for this player: `won` decides
    /// whether the winner or loser deltas are added, `game_slug` picks the
    /// per-game bucket, and `seat_count` scales the winner's rank points.
    pub fn apply_finish(&mut self, game_slug: &str, seat_count: u32, won: bool) {
        let per_game = self.per_game_stats.entry(game_slug.to_string()).or_default();

        self.total_games += 1;
        per_game.games += 1;

        if won {
            let delta = WINNER_RANK_POINTS_PER_SEAT * seat_count;
            self.total_wins += 1;
            self.rank_point += delta;
            per_game.wins += 1;
            per_game.rank_point += delta;
        } else {
            self.total_losses += 1;
            self.rank_point += LOSER_RANK_POINTS;
            per_game.losses += 1;
            per_game.rank_point += LOSER_RANK_POINTS;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_win_scales_rank_points_by_seat_count() {
        let mut stats = PlayerStats::default();
        stats.apply_finish("dicewars", 4, true);

        assert_eq!(stats.total_games, 1);
        assert_eq!(stats.total_wins, 1);
        assert_eq!(stats.total_losses, 0);
        assert_eq!(stats.rank_point, 40);
        assert_eq!(stats.per_game_stats["dicewars"].wins, 1);
        assert_eq!(stats.per_game_stats["dicewars"].rank_point, 40);
    }

    #[test]
    fn a_loss_awards_a_flat_five_points() {
        let mut stats = PlayerStats::default();
        stats.apply_finish("dicewars", 4, false);

        assert_eq!(stats.total_losses, 1);
        assert_eq!(stats.rank_point, 5);
        assert_eq!(stats.per_game_stats["dicewars"].losses, 1);
    }

    #[test]
    fn stats_accumulate_across_multiple_games() {
        let mut stats = PlayerStats::default();
        stats.apply_finish("dicewars", 2, true);
        stats.apply_finish("dicewars", 3, false);

        assert_eq!(stats.total_games, 2);
        assert_eq!(stats.rank_point, 20 + 5);
        assert_eq!(stats.per_game_stats["dicewars"].games, 2);
    }
}
