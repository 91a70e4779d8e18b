//! High score tracking
//!
//! Kept in memory for the lifetime of the process: the best turn count ever
//! reached plus a leaderboard of the top 10 finished games.

use serde::{Deserialize, Serialize};

/// Maximum number of leaderboard entries to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Turns completed before the tower fell
    pub turns: u32,
    /// Simulation ticks the game lasted
    pub ticks: u64,
}

/// High score and leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    /// Best turn count so far
    best: u32,
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Best turn count so far
    pub fn best(&self) -> u32 {
        self.best
    }

    /// Check if a game qualifies for the leaderboard
    pub fn qualifies(&self, turns: u32) -> bool {
        if turns == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| turns > e.turns).unwrap_or(true)
    }

    /// Record a finished game. The best score becomes the max of itself and
    /// `turns`. Returns the leaderboard rank (1-indexed) if the game made it.
    pub fn record_game(&mut self, turns: u32, ticks: u64) -> Option<usize> {
        self.best = self.best.max(turns);

        if !self.qualifies(turns) {
            return None;
        }

        let entry = HighScoreEntry { turns, ticks };

        // Sorted descending by turns; ties keep the earlier game first
        let pos = self.entries.iter().position(|e| turns > e.turns);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        log::info!("Game recorded: {} turns, rank {}", turns, rank);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_turn_game_not_listed() {
        let mut scores = HighScores::new();
        assert_eq!(scores.record_game(0, 100), None);
        assert!(scores.is_empty());
        assert_eq!(scores.best(), 0);
    }

    #[test]
    fn test_ranks_sorted_descending() {
        let mut scores = HighScores::new();
        assert_eq!(scores.record_game(3, 10), Some(1));
        assert_eq!(scores.record_game(7, 10), Some(1));
        assert_eq!(scores.record_game(5, 10), Some(2));
        let turns: Vec<u32> = scores.entries.iter().map(|e| e.turns).collect();
        assert_eq!(turns, vec![7, 5, 3]);
        assert_eq!(scores.best(), 7);
    }

    #[test]
    fn test_leaderboard_is_capped() {
        let mut scores = HighScores::new();
        for t in 1..=15 {
            scores.record_game(t, 0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.turns), Some(6));
        assert_eq!(scores.record_game(2, 0), None);
    }

    proptest! {
        #[test]
        fn best_is_max_of_all_games(games in proptest::collection::vec(0u32..200, 1..40)) {
            let mut scores = HighScores::new();
            let mut previous = 0;
            for &turns in &games {
                scores.record_game(turns, 0);
                prop_assert!(scores.best() >= previous);
                previous = scores.best();
            }
            prop_assert_eq!(scores.best(), games.iter().copied().max().unwrap_or(0));
        }
    }
}
