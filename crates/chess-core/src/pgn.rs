//! PGN intake: keeps the games one player took part in, as SAN move lists.

use std::io::{self, Read};
use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Visitor};

use crate::game_data::{GameOutcome, MoveList, PlayerColor, StoredGame};
use crate::notation::STARTING_FEN;

#[derive(Default)]
pub struct GameTags {
    white: String,
    black: String,
    result: String,
    site: Option<String>,
    fen: Option<String>,
}

/// A game the player took part in, while its moves are read.
pub struct PendingGame {
    game_id: String,
    color: PlayerColor,
    result: GameOutcome,
    moves: Vec<String>,
}

/// Visitor collecting one player's finished games from any number of PGN sources.
///
/// Games the player did not play, unfinished games and games set up from a
/// non-standard position are skipped. Ids are the `Site` (or `Link`) tag plus
/// the scan index, or `game-N` without one.
pub struct PgnCollector {
    player: String,
    max_plies: usize,
    games: Vec<StoredGame>,
    scanned: u64,
}

impl PgnCollector {
    /// Keep at most `max_plies` SAN tokens per game; later moves are not stored.
    pub fn new(player: &str, max_plies: usize) -> Self {
        Self {
            player: player.to_string(),
            max_plies,
            games: Vec::new(),
            scanned: 0,
        }
    }

    /// Read every game from `source`.
    pub fn read_all<R: Read>(&mut self, source: R) -> io::Result<()> {
        let mut reader = Reader::new(source);
        while reader.read_game(self)?.is_some() {}
        Ok(())
    }

    /// Games seen so far, kept or not.
    pub fn scanned(&self) -> u64 {
        self.scanned
    }

    pub fn games(&self) -> &[StoredGame] {
        &self.games
    }

    pub fn into_games(self) -> Vec<StoredGame> {
        self.games
    }
}

impl Visitor for PgnCollector {
    type Tags = GameTags;
    type Movetext = PendingGame;
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<(), GameTags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(&mut self, tags: &mut GameTags, name: &[u8], value: RawTag<'_>) -> ControlFlow<()> {
        let value = value.decode_utf8_lossy().into_owned();
        match name {
            b"White" => tags.white = value,
            b"Black" => tags.black = value,
            b"Result" => tags.result = value,
            b"Site" | b"Link" => tags.site = Some(value),
            b"FEN" => tags.fen = Some(value),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: GameTags) -> ControlFlow<(), PendingGame> {
        self.scanned += 1;

        if tags.fen.as_deref().is_some_and(|fen| fen != STARTING_FEN) {
            return ControlFlow::Break(());
        }

        let color = if tags.white.eq_ignore_ascii_case(&self.player) {
            PlayerColor::White
        } else if tags.black.eq_ignore_ascii_case(&self.player) {
            PlayerColor::Black
        } else {
            return ControlFlow::Break(());
        };
        let Some(result) = GameOutcome::from_pgn_result(&tags.result, color) else {
            return ControlFlow::Break(());
        };

        // Site is shared by every game of an event, so the scan index keeps ids unique
        let game_id = match tags.site {
            Some(site) => format!("{site}#{}", self.scanned),
            None => format!("game-{}", self.scanned),
        };

        ControlFlow::Continue(PendingGame {
            game_id,
            color,
            result,
            moves: Vec::new(),
        })
    }

    fn san(&mut self, game: &mut PendingGame, san_plus: SanPlus) -> ControlFlow<()> {
        if game.moves.len() < self.max_plies {
            game.moves.push(san_plus.san.to_string());
        }
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, game: PendingGame) {
        if game.moves.is_empty() {
            return;
        }
        self.games.push(StoredGame::new(
            game.game_id,
            MoveList::San(game.moves),
            game.result,
            game.color,
        ));
    }
}
