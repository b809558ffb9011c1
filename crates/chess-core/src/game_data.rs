use serde::{Deserialize, Serialize};

use crate::pgn::PgnCollector;

/// Side the account holder played in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerColor::White => "white",
            PlayerColor::Black => "black",
        }
    }

    /// Parses the stored `user_color` value ("white" / "black", any case).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "white" => Some(PlayerColor::White),
            "black" => Some(PlayerColor::Black),
            _ => None,
        }
    }
}

/// Game result from the account holder's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

impl GameOutcome {
    /// Parses the stored result code: "W", "L", anything else is a draw.
    pub fn from_code(code: &str) -> Self {
        match code {
            "W" => GameOutcome::Win,
            "L" => GameOutcome::Loss,
            _ => GameOutcome::Draw,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            GameOutcome::Win => "W",
            GameOutcome::Loss => "L",
            GameOutcome::Draw => "D",
        }
    }

    /// Maps a PGN result tag onto the given side. Unfinished games ("*") yield `None`.
    pub fn from_pgn_result(result: &str, color: PlayerColor) -> Option<Self> {
        let outcome = match (result, color) {
            ("1-0", PlayerColor::White) | ("0-1", PlayerColor::Black) => GameOutcome::Win,
            ("0-1", PlayerColor::White) | ("1-0", PlayerColor::Black) => GameOutcome::Loss,
            ("1/2-1/2", _) => GameOutcome::Draw,
            _ => return None,
        };
        Some(outcome)
    }
}

/// A game's moves in whichever format the platform stored them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "format", content = "data", rename_all = "lowercase")]
pub enum MoveList {
    /// One SAN token per ply.
    San(Vec<String>),
    /// Chess.com TCN, two characters per ply.
    Tcn(String),
}

impl MoveList {
    pub fn format(&self) -> &'static str {
        match self {
            MoveList::San(_) => "san",
            MoveList::Tcn(_) => "tcn",
        }
    }

    pub fn ply_count(&self) -> usize {
        match self {
            MoveList::San(tokens) => tokens.len(),
            MoveList::Tcn(tcn) => tcn.len() / 2,
        }
    }
}

/// One game as supplied by the game store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGame {
    pub game_id: String,
    pub moves: MoveList,
    pub result: GameOutcome,
    pub player_color: PlayerColor,
}

impl StoredGame {
    pub fn new(
        game_id: impl Into<String>,
        moves: MoveList,
        result: GameOutcome,
        player_color: PlayerColor,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            moves,
            result,
            player_color,
        }
    }

    /// Convenience for SAN move lists written as a single space-separated string.
    pub fn from_san(
        game_id: impl Into<String>,
        moves: &str,
        result: GameOutcome,
        player_color: PlayerColor,
    ) -> Self {
        let tokens = moves.split_whitespace().map(str::to_string).collect();
        Self::new(game_id, MoveList::San(tokens), result, player_color)
    }

    /// Builds a game from the first game in `pgn_text` that `player` took part in,
    /// with color and result taken relative to them. Returns `None` when there is
    /// no such finished game from the standard start.
    pub fn from_pgn(game_id: impl Into<String>, pgn_text: &str, player: &str) -> Option<Self> {
        let mut collector = PgnCollector::new(player, usize::MAX);
        collector.read_all(pgn_text.as_bytes()).ok()?;
        let mut game = collector.into_games().into_iter().next()?;
        game.game_id = game_id.into();
        Some(game)
    }
}
