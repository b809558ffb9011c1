//! Game records and move-list replay shared by the opening explorer.

pub mod game_data;
pub mod notation;
pub mod pgn;
pub mod tcn;

pub use game_data::{GameOutcome, MoveList, PlayerColor, StoredGame};
pub use notation::{normalize_san, replay, NotationError, ReplayedPly, STARTING_FEN};
