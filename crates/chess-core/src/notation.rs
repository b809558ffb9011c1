//! Replays a stored move list into the positions it passes through.

use shakmaty::{
    fen::Fen,
    san::{San, SanPlus},
    CastlingMode, Chess, EnPassantMode, Move, Position,
};

use crate::game_data::MoveList;
use crate::tcn;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("Invalid SAN '{token}' at ply {ply}")]
    InvalidSan { ply: usize, token: String },

    #[error("Illegal move '{token}' at ply {ply}")]
    IllegalMove { ply: usize, token: String },

    #[error("Invalid TCN '{token}' at ply {ply}")]
    InvalidTcn { ply: usize, token: String },
}

/// The position reached after one ply, with the move that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedPly {
    /// Full FEN after the move.
    pub fen: String,
    pub san: String,
    pub uci: String,
}

/// Replays at most `max_plies` moves from the standard starting position.
///
/// Moves past the cap are not inspected. Any move before the cap that does not
/// apply to the current position fails the whole replay.
pub fn replay(moves: &MoveList, max_plies: usize) -> Result<Vec<ReplayedPly>, NotationError> {
    let mut pos = Chess::default();
    let mut plies = Vec::with_capacity(moves.ply_count().min(max_plies));

    match moves {
        MoveList::San(tokens) => {
            for (ply, token) in tokens.iter().take(max_plies).enumerate() {
                let san_plus: SanPlus =
                    token.trim().parse().map_err(|_| NotationError::InvalidSan {
                        ply,
                        token: token.clone(),
                    })?;
                let mv = san_plus
                    .san
                    .to_move(&pos)
                    .map_err(|_| NotationError::IllegalMove {
                        ply,
                        token: token.clone(),
                    })?;
                plies.push(play(&mut pos, mv));
            }
        }
        MoveList::Tcn(tcn) => {
            for mv in tcn::decode_tcn(tcn, max_plies)? {
                plies.push(play(&mut pos, mv));
            }
        }
    }

    Ok(plies)
}

/// SAN as recorded on a replayed ply: check and mate suffixes dropped.
/// Tokens that do not parse are returned trimmed, unchanged.
pub fn normalize_san(token: &str) -> String {
    let token = token.trim();
    token
        .parse::<SanPlus>()
        .map(|san_plus| san_plus.san.to_string())
        .unwrap_or_else(|_| token.to_string())
}

/// Full FEN of a position, en passant square only when a capture is legal.
pub fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

fn play(pos: &mut Chess, mv: Move) -> ReplayedPly {
    let san = San::from_move(&*pos, mv.clone()).to_string();
    let uci = mv.clone().to_uci(CastlingMode::Standard).to_string();
    pos.play_unchecked(mv);
    ReplayedPly {
        fen: fen_of(pos),
        san,
        uci,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn san_list(moves: &str) -> MoveList {
        MoveList::San(moves.split_whitespace().map(str::to_string).collect())
    }

    #[test]
    fn test_replay_san() {
        let plies = replay(&san_list("e4 e5 Nf3+ Nc6 O-O"), 60);
        // O-O is not legal yet: bishop still on f1
        assert_eq!(
            plies,
            Err(NotationError::IllegalMove {
                ply: 4,
                token: "O-O".into()
            })
        );

        let plies = replay(&san_list("e4 e5 Nf3 Nc6"), 60).unwrap();
        assert_eq!(plies.len(), 4);
        assert_eq!(plies[0].san, "e4");
        assert_eq!(plies[0].uci, "e2e4");
        assert_eq!(plies[2].san, "Nf3");
        assert_eq!(
            plies[3].fen,
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3"
        );
    }

    #[test]
    fn test_replay_respects_cap() {
        // The garbage token sits past the cap, so it is never parsed
        let plies = replay(&san_list("d4 d5 c4 zz9"), 3).unwrap();
        assert_eq!(plies.len(), 3);
    }

    #[test]
    fn test_normalize_san_drops_suffix() {
        assert_eq!(normalize_san("Qxf7#"), "Qxf7");
        assert_eq!(normalize_san(" Bb5+"), "Bb5");
        assert_eq!(normalize_san("O-O"), "O-O");
        assert_eq!(normalize_san("e8=Q+"), "e8=Q");
        assert_eq!(normalize_san("??"), "??");
    }

    #[test]
    fn test_replay_rejects_bad_token() {
        let err = replay(&san_list("e4 ??"), 60).unwrap_err();
        assert!(matches!(err, NotationError::InvalidSan { ply: 1, .. }));
    }
}
