//! Replays one game into the positions it visits, root first.

use chess_core::{replay, MoveList, NotationError, STARTING_FEN};

use crate::canonical::{canonicalize, PositionKey};

/// The move that led into a walked position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub san: String,
    pub uci: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkRecord {
    pub key: PositionKey,
    /// Full FEN, kept for rendering.
    pub snapshot: String,
    /// `None` for the starting position.
    pub played: Option<PlayedMove>,
    pub depth: usize,
}

/// Walk a game up to `max_depth_plies` plies.
///
/// Records run from depth 0 (starting position) to the last replayed ply.
/// A move that cannot be applied fails the whole walk, never a prefix of it.
pub fn walk(
    game_id: &str,
    moves: &MoveList,
    max_depth_plies: usize,
) -> Result<Vec<WalkRecord>, NotationError> {
    let plies = replay(moves, max_depth_plies).inspect_err(|e| {
        tracing::debug!(game_id, error = %e, "Game moves do not replay");
    })?;

    let mut records = Vec::with_capacity(plies.len() + 1);
    records.push(WalkRecord {
        key: canonicalize(STARTING_FEN),
        snapshot: STARTING_FEN.to_string(),
        played: None,
        depth: 0,
    });

    for (ply, replayed) in plies.into_iter().enumerate() {
        records.push(WalkRecord {
            key: canonicalize(&replayed.fen),
            snapshot: replayed.fen,
            played: Some(PlayedMove {
                san: replayed.san,
                uci: replayed.uci,
            }),
            depth: ply + 1,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn san_list(moves: &str) -> MoveList {
        MoveList::San(moves.split_whitespace().map(str::to_string).collect())
    }

    #[test]
    fn test_walk_records_root_then_plies() {
        let records = walk("g1", &san_list("e4 e5"), 60).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].depth, 0);
        assert!(records[0].played.is_none());
        assert_eq!(records[1].played.as_ref().unwrap().san, "e4");
        assert_eq!(records[2].depth, 2);
        assert_eq!(
            records[2].key.as_str(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w"
        );
    }

    #[test]
    fn test_walk_caps_depth() {
        let records = walk("g1", &san_list("Nf3 Nf6 Ng1 Ng8 Nc3 Nc6"), 4).unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records.last().unwrap().depth, 4);
    }

    #[test]
    fn test_walk_fails_whole_game() {
        assert!(walk("g1", &san_list("e4 e5 Ke3"), 60).is_err());
    }
}
