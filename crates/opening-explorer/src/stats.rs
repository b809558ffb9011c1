//! Win/loss/draw tallies carried by every node and move.

use chess_core::{GameOutcome, PlayerColor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Stats {
    pub fn record(&mut self, outcome: GameOutcome) {
        self.total += 1;
        match outcome {
            GameOutcome::Win => self.wins += 1,
            GameOutcome::Loss => self.losses += 1,
            GameOutcome::Draw => self.draws += 1,
        }
    }

    /// Percentage of games won, 0 when empty.
    pub fn win_rate(&self) -> f64 {
        if self.total > 0 {
            100.0 * self.wins as f64 / self.total as f64
        } else {
            0.0
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.wins + self.losses + self.draws == self.total
    }
}

/// Aggregate tally plus the same tally split by the color the player held.
/// All three are updated together, so `aggregate == white + black` holds by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitStats {
    pub aggregate: Stats,
    pub white: Stats,
    pub black: Stats,
}

impl SplitStats {
    pub fn record(&mut self, outcome: GameOutcome, color: PlayerColor) {
        self.aggregate.record(outcome);
        match color {
            PlayerColor::White => self.white.record(outcome),
            PlayerColor::Black => self.black.record(outcome),
        }
    }

    pub fn for_color(&self, color: PlayerColor) -> &Stats {
        match color {
            PlayerColor::White => &self.white,
            PlayerColor::Black => &self.black,
        }
    }

    /// One color's block moved into the aggregate slot; the other color is emptied.
    pub fn promote(&self, color: PlayerColor) -> SplitStats {
        let stats = *self.for_color(color);
        match color {
            PlayerColor::White => SplitStats {
                aggregate: stats,
                white: stats,
                black: Stats::default(),
            },
            PlayerColor::Black => SplitStats {
                aggregate: stats,
                white: Stats::default(),
                black: stats,
            },
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.aggregate.is_consistent()
            && self.white.is_consistent()
            && self.black.is_consistent()
            && self.aggregate.total == self.white.total + self.black.total
    }
}
