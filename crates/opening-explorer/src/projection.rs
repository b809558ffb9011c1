//! Single-color views derived from a built "both" tree.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chess_core::PlayerColor;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::tree::{MoveEdge, OpeningTree, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perspective {
    Both,
    White,
    Black,
}

impl Perspective {
    pub fn as_str(self) -> &'static str {
        match self {
            Perspective::Both => "both",
            Perspective::White => "white",
            Perspective::Black => "black",
        }
    }

    /// The color filtered on, `None` for the unfiltered view.
    pub fn color(self) -> Option<PlayerColor> {
        match self {
            Perspective::Both => None,
            Perspective::White => Some(PlayerColor::White),
            Perspective::Black => Some(PlayerColor::Black),
        }
    }
}

impl From<PlayerColor> for Perspective {
    fn from(color: PlayerColor) -> Self {
        match color {
            PlayerColor::White => Perspective::White,
            PlayerColor::Black => Perspective::Black,
        }
    }
}

impl FromStr for Perspective {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "both" | "all" => Ok(Perspective::Both),
            "white" => Ok(Perspective::White),
            "black" => Ok(Perspective::Black),
            _ => Err(ValidationError::UnknownPerspective(s.to_string())),
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter a tree down to games where the player held `color`.
///
/// Nodes and moves with no such games are dropped (the root always stays), the
/// color's tally replaces the aggregate, and moves are re-sorted by it. No game
/// is replayed.
pub fn project(tree: &OpeningTree, color: PlayerColor) -> OpeningTree {
    let mut nodes = HashMap::with_capacity(tree.nodes.len());

    for (key, node) in &tree.nodes {
        if node.stats.for_color(color).total == 0 && *key != tree.root {
            continue;
        }

        let edges = node
            .edges
            .iter()
            .filter(|edge| edge.stats.for_color(color).total > 0)
            .map(|edge| MoveEdge {
                san: edge.san.clone(),
                uci: edge.uci.clone(),
                target: edge.target.clone(),
                stats: edge.stats.promote(color),
            })
            .collect();

        nodes.insert(
            key.clone(),
            TreeNode {
                key: node.key.clone(),
                fen: node.fen.clone(),
                parent: node.parent.clone(),
                move_san: node.move_san.clone(),
                edges,
                stats: node.stats.promote(color),
                depth: node.depth,
            },
        );
    }

    let game_count = tree
        .root_node()
        .map(|root| root.stats.for_color(color).total)
        .unwrap_or(0);

    let mut projected = OpeningTree {
        perspective: color.into(),
        root: tree.root.clone(),
        nodes,
        game_count,
        included_games: tree.included_games,
        excluded_games: tree.excluded_games,
        truncated_games: tree.truncated_games,
        max_depth_plies: tree.max_depth_plies,
    };
    projected.sort_edges();
    projected.retain_reachable();
    projected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perspective_parsing() {
        assert_eq!("White".parse::<Perspective>(), Ok(Perspective::White));
        assert_eq!("both".parse::<Perspective>(), Ok(Perspective::Both));
        assert_eq!(
            "purple".parse::<Perspective>(),
            Err(ValidationError::UnknownPerspective("purple".into()))
        );
        assert_eq!(Perspective::Black.color(), Some(PlayerColor::Black));
        assert_eq!(Perspective::Both.color(), None);
    }

    #[test]
    fn test_color_without_games_keeps_bare_root() {
        let games = vec![chess_core::StoredGame::from_san(
            "1",
            "e4 e5",
            chess_core::GameOutcome::Win,
            PlayerColor::White,
        )];
        let tree = crate::aggregate(&games, &crate::BuildOptions::default());
        let black = project(&tree, PlayerColor::Black);

        assert_eq!(black.len(), 1);
        assert_eq!(black.game_count, 0);
        assert!(black.root_node().unwrap().edges.is_empty());
        assert_eq!(black.perspective, Perspective::Black);
    }
}
