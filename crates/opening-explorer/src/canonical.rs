//! Position keys: board placement plus side to move.
//!
//! Castling rights, en passant target and move counters are dropped, so
//! positions that differ only in those fields share one explorer node.

use std::fmt;

use chess_core::STARTING_FEN;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduce a FEN (or an existing key) to its position key.
pub fn canonicalize(snapshot: &str) -> PositionKey {
    PositionKey(snapshot.split_whitespace().take(2).collect::<Vec<_>>().join(" "))
}

pub fn starting_key() -> PositionKey {
    canonicalize(STARTING_FEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_drops_rights_and_counters() {
        let a = canonicalize("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let b = canonicalize("r3k2r/8/8/8/8/8/8/R3K2R w - - 12 40");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "r3k2r/8/8/8/8/8/8/R3K2R w");

        let ep = canonicalize("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3");
        let no_ep = canonicalize("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3");
        assert_eq!(ep, no_ep);
    }

    #[test]
    fn test_side_to_move_is_kept() {
        let white = canonicalize("8/8/8/8/8/8/8/K6k w - - 0 1");
        let black = canonicalize("8/8/8/8/8/8/8/K6k b - - 0 1");
        assert_ne!(white, black);
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let key = starting_key();
        assert_eq!(canonicalize(key.as_str()), key);
    }
}
