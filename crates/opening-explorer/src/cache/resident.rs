//! In-memory tier: the last built "both" tree and its projections.

use std::sync::{Arc, OnceLock};

use chess_core::PlayerColor;

use crate::hash::ContentHash;
use crate::projection::{project, Perspective};
use crate::tree::OpeningTree;

/// An immutable "both" tree with per-color views computed on first use.
#[derive(Debug)]
pub struct ResidentTree {
    hash: ContentHash,
    both: Arc<OpeningTree>,
    white: OnceLock<Arc<OpeningTree>>,
    black: OnceLock<Arc<OpeningTree>>,
}

impl ResidentTree {
    pub fn new(hash: ContentHash, both: Arc<OpeningTree>) -> Self {
        Self {
            hash,
            both,
            white: OnceLock::new(),
            black: OnceLock::new(),
        }
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn both(&self) -> &Arc<OpeningTree> {
        &self.both
    }

    pub fn view(&self, perspective: Perspective) -> Arc<OpeningTree> {
        let (memo, color) = match perspective {
            Perspective::Both => return self.both.clone(),
            Perspective::White => (&self.white, PlayerColor::White),
            Perspective::Black => (&self.black, PlayerColor::Black),
        };
        memo.get_or_init(|| {
            tracing::debug!(hash = %self.hash, %perspective, "Projecting opening tree");
            Arc::new(project(&self.both, color))
        })
        .clone()
    }
}

/// Holds at most one resident tree; a new hash replaces it wholesale.
#[derive(Debug, Default)]
pub struct ResidentCache {
    current: Option<ResidentTree>,
}

impl ResidentCache {
    pub fn lookup(&self, hash: &ContentHash) -> Option<&ResidentTree> {
        self.current.as_ref().filter(|tree| tree.hash() == hash)
    }

    pub fn current(&self) -> Option<&ResidentTree> {
        self.current.as_ref()
    }

    pub fn replace(&mut self, hash: ContentHash, both: Arc<OpeningTree>) {
        self.current = Some(ResidentTree::new(hash, both));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::config::BuildOptions;
    use crate::hash::content_hash;
    use chess_core::{GameOutcome, StoredGame};

    #[test]
    fn test_projection_is_memoized_per_color() {
        let games = vec![
            StoredGame::from_san("1", "e4 e5", GameOutcome::Win, PlayerColor::White),
            StoredGame::from_san("2", "d4 d5", GameOutcome::Loss, PlayerColor::Black),
        ];
        let options = BuildOptions::default();
        let hash = content_hash(&games, &options);

        let mut cache = ResidentCache::default();
        cache.replace(hash.clone(), Arc::new(aggregate(&games, &options)));

        let resident = cache.lookup(&hash).unwrap();
        let first = resident.view(Perspective::White);
        let second = resident.view(Perspective::White);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.game_count, 1);
        assert_eq!(resident.view(Perspective::Black).game_count, 1);
        assert!(Arc::ptr_eq(&resident.view(Perspective::Both), resident.both()));
    }
}
