//! TCN (Terse Chess Notation) decoder for Chess.com games.
//! TCN is a compact 2-char-per-move encoding.

use shakmaty::{Chess, File, Move, Position, Role, Square};

use crate::notation::NotationError;

const TCN_CHARS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!?{~}(^)[_]@#$,./&-*++=";

const PROMO_ROLES: [Role; 4] = [Role::Queen, Role::Knight, Role::Rook, Role::Bishop];

fn char_to_idx(c: u8) -> Option<usize> {
    TCN_CHARS.iter().position(|&x| x == c)
}

/// Decode the first `max_plies` moves of a TCN string.
/// Fails on the first pair that does not name a legal move in the current position.
pub fn decode_tcn(tcn: &str, max_plies: usize) -> Result<Vec<Move>, NotationError> {
    let mut pos = Chess::default();
    let mut moves = Vec::new();

    for (ply, pair) in tcn.as_bytes().chunks(2).take(max_plies).enumerate() {
        let token = String::from_utf8_lossy(pair).into_owned();
        let invalid = || NotationError::InvalidTcn {
            ply,
            token: token.clone(),
        };

        let &[from_char, to_char] = pair else {
            return Err(invalid());
        };
        let from_idx = char_to_idx(from_char).filter(|&i| i < 64).ok_or_else(invalid)?;
        let to_idx = char_to_idx(to_char).ok_or_else(invalid)?;

        let (to_idx, promotion) = if to_idx >= 64 {
            // Promotion: piece and file offset packed above the board squares
            let promo_value = to_idx - 64;
            let role = *PROMO_ROLES.get(promo_value / 3).ok_or_else(invalid)?;
            let to_file = (from_idx % 8) as i32 + (promo_value % 3) as i32 - 1;
            if !(0..8).contains(&to_file) {
                return Err(invalid());
            }
            let to_rank = if from_idx / 8 == 6 { 7 } else { 0 };
            (to_rank * 8 + to_file as usize, Some(role))
        } else {
            (to_idx, None)
        };

        let from = Square::new(from_idx as u32);
        let to = Square::new(to_idx as u32);
        let mv = find_legal(&pos, from, to, promotion).ok_or_else(|| {
            NotationError::IllegalMove {
                ply,
                token: token.clone(),
            }
        })?;

        pos.play_unchecked(mv.clone());
        moves.push(mv);
    }

    Ok(moves)
}

/// Match decoded squares against the legal moves of `pos`.
/// Castling is written as the king's destination square.
fn find_legal(pos: &Chess, from: Square, to: Square, promotion: Option<Role>) -> Option<Move> {
    pos.legal_moves().into_iter().find(|m| match m {
        Move::Castle { king, rook } => {
            let king_to_file = if rook.file() > king.file() { File::G } else { File::C };
            *king == from && (to == Square::from_coords(king_to_file, king.rank()) || to == *rook)
        }
        _ => m.from() == Some(from) && m.to() == to && m.promotion() == promotion,
    })
}
