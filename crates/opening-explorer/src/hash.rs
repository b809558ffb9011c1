//! Order-independent content hash of a game set.

use std::fmt;

use chess_core::{MoveList, StoredGame};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::BuildOptions;

const HASH_DOMAIN: &[u8] = b"opening-tree/v1";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash the build options and every game's id, moves, result and color.
/// Per-game digests are sorted first, so reordering the games keeps the hash.
pub fn content_hash(games: &[StoredGame], options: &BuildOptions) -> ContentHash {
    let mut digests: Vec<[u8; 32]> = games.iter().map(game_digest).collect();
    digests.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(HASH_DOMAIN);
    hasher.update((options.max_depth_plies as u64).to_le_bytes());
    hasher.update(options.min_games_per_node.to_le_bytes());
    for digest in &digests {
        hasher.update(digest);
    }

    ContentHash(hex::encode(hasher.finalize()))
}

fn game_digest(game: &StoredGame) -> [u8; 32] {
    let mut hasher = Sha256::new();
    update_field(&mut hasher, game.game_id.as_bytes());
    update_field(&mut hasher, game.moves.format().as_bytes());
    match &game.moves {
        MoveList::San(tokens) => {
            hasher.update((tokens.len() as u64).to_le_bytes());
            for token in tokens {
                update_field(&mut hasher, token.as_bytes());
            }
        }
        MoveList::Tcn(tcn) => update_field(&mut hasher, tcn.as_bytes()),
    }
    update_field(&mut hasher, game.result.code().as_bytes());
    update_field(&mut hasher, game.player_color.as_str().as_bytes());
    hasher.finalize().into()
}

/// Length-prefixed so adjacent fields cannot run into each other.
fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{GameOutcome, PlayerColor};

    fn games() -> Vec<StoredGame> {
        vec![
            StoredGame::from_san("1", "e4 e5", GameOutcome::Win, PlayerColor::White),
            StoredGame::from_san("2", "d4 d5", GameOutcome::Loss, PlayerColor::Black),
            StoredGame::new("3", MoveList::Tcn("mC0K".into()), GameOutcome::Draw, PlayerColor::White),
        ]
    }

    #[test]
    fn test_hash_ignores_order() {
        let options = BuildOptions::default();
        let mut reversed = games();
        reversed.reverse();
        assert_eq!(content_hash(&games(), &options), content_hash(&reversed, &options));
        assert_eq!(content_hash(&games(), &options).as_str().len(), 64);
    }

    #[test]
    fn test_hash_tracks_content_and_options() {
        let options = BuildOptions::default();
        let base = content_hash(&games(), &options);

        let mut changed = games();
        changed[1].result = GameOutcome::Win;
        assert_ne!(base, content_hash(&changed, &options));

        let mut fewer = games();
        fewer.pop();
        assert_ne!(base, content_hash(&fewer, &options));

        let shallow = BuildOptions {
            max_depth_plies: 20,
            ..BuildOptions::default()
        };
        assert_ne!(base, content_hash(&games(), &shallow));
    }
}
