#![allow(dead_code)]

use chess_core::{GameOutcome, PlayerColor, StoredGame};
use opening_explorer::OpeningTree;

pub fn white(id: &str, moves: &str, result: GameOutcome) -> StoredGame {
    StoredGame::from_san(id, moves, result, PlayerColor::White)
}

pub fn black(id: &str, moves: &str, result: GameOutcome) -> StoredGame {
    StoredGame::from_san(id, moves, result, PlayerColor::Black)
}

/// Knights out and back, repeated to reach `plies` plies.
pub fn shuffle_moves(plies: usize) -> String {
    ["Nf3", "Nf6", "Ng1", "Ng8"]
        .iter()
        .cycle()
        .take(plies)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A mixed set: both colors, all results, a transposition and a bad game.
pub fn sample_games() -> Vec<StoredGame> {
    vec![
        white("w1", "e4 e5 Nf3 Nc6 Bb5 a6", GameOutcome::Win),
        white("w2", "e4 c5 Nf3 d6 d4 cxd4", GameOutcome::Loss),
        white("w3", "Nf3 e5 e4 Nc6", GameOutcome::Draw),
        white("w4", "d4 d5 c4 e6 Nc3 Nf6", GameOutcome::Win),
        black("b1", "e4 e5 Nf3 Nf6 Nxe5 d6", GameOutcome::Win),
        black("b2", "d4 Nf6 c4 g6 Nc3 Bg7", GameOutcome::Loss),
        black("b3", "e4 c5 Nc3 Nc6", GameOutcome::Draw),
        black("b4", "e4 e5 Qh5 Ke7", GameOutcome::Loss),
        white("bad", "e4 e5 Ke3", GameOutcome::Win),
    ]
}

/// Every node and edge keeps wins + losses + draws == total == white + black,
/// and every edge steps exactly one ply deeper.
pub fn assert_consistent(tree: &OpeningTree) {
    for node in tree.nodes.values() {
        assert!(node.stats.is_consistent(), "node {} inconsistent", node.key);
        for edge in &node.edges {
            assert!(edge.stats.is_consistent(), "edge {} inconsistent", edge.san);
            let target = &tree.nodes[&edge.target];
            assert_eq!(target.depth, node.depth + 1, "edge {} skips depth", edge.san);
        }
    }
}

/// Node set, stats and edge order, ignoring which game first named a shared node.
pub fn shape(tree: &OpeningTree) -> Vec<(String, String, Vec<(String, String, String)>)> {
    let mut nodes: Vec<_> = tree
        .nodes
        .values()
        .map(|node| {
            let edges = node
                .edges
                .iter()
                .map(|e| (e.san.clone(), e.target.to_string(), format!("{:?}", e.stats)))
                .collect();
            (node.key.to_string(), format!("{:?}", node.stats), edges)
        })
        .collect();
    nodes.sort();
    nodes
}
