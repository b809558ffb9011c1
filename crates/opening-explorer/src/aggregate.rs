//! Folds walked games into one explorer tree.

use std::collections::HashMap;
use std::time::Instant;

use chess_core::{StoredGame, STARTING_FEN};
use tracing::{debug, info};

use crate::canonical::{starting_key, PositionKey};
use crate::config::BuildOptions;
use crate::projection::Perspective;
use crate::stats::SplitStats;
use crate::tree::{MoveEdge, OpeningTree, TreeNode};
use crate::walker::{walk, WalkRecord};

/// Build the "both" tree for a set of games.
///
/// Games whose moves fail to replay are counted in `excluded_games` and
/// contribute nothing. Statistics are plain sums, so the result does not depend
/// on the order of `games` beyond which game first names a shared node.
pub fn aggregate(games: &[StoredGame], options: &BuildOptions) -> OpeningTree {
    let start = Instant::now();

    let mut excluded_games = 0u32;
    let mut walks: Vec<(&StoredGame, Vec<WalkRecord>)> = Vec::with_capacity(games.len());

    for game in games {
        match walk(&game.game_id, &game.moves, options.max_depth_plies) {
            Ok(records) => walks.push((game, records)),
            Err(e) => {
                excluded_games += 1;
                debug!(game_id = %game.game_id, error = %e, "Excluding game from opening tree");
            }
        }
    }

    // A position's depth is the shallowest ply any game reaches it at. Games
    // arriving later (lost tempo, repetition) stop there so edges always go d -> d+1.
    let mut depth_of: HashMap<&PositionKey, usize> = HashMap::new();
    for (_, records) in &walks {
        for record in records {
            depth_of
                .entry(&record.key)
                .and_modify(|depth| *depth = (*depth).min(record.depth))
                .or_insert(record.depth);
        }
    }

    let mut nodes: HashMap<PositionKey, TreeNode> = HashMap::new();
    let mut truncated_games = 0u32;

    for (game, records) in &walks {
        let mut parent: Option<&WalkRecord> = None;

        for record in records {
            if depth_of.get(&record.key) != Some(&record.depth) {
                truncated_games += 1;
                break;
            }

            nodes
                .entry(record.key.clone())
                .or_insert_with(|| new_node(record, parent))
                .stats
                .record(game.result, game.player_color);

            if let (Some(prev), Some(played)) = (parent, &record.played) {
                if let Some(parent_node) = nodes.get_mut(&prev.key) {
                    let edge = match parent_node.edges.iter().position(|e| e.san == played.san) {
                        Some(idx) => &mut parent_node.edges[idx],
                        None => {
                            parent_node.edges.push(MoveEdge {
                                san: played.san.clone(),
                                uci: played.uci.clone(),
                                target: record.key.clone(),
                                stats: SplitStats::default(),
                            });
                            let last = parent_node.edges.len() - 1;
                            &mut parent_node.edges[last]
                        }
                    };
                    edge.stats.record(game.result, game.player_color);
                }
            }

            parent = Some(record);
        }
    }

    let root = starting_key();
    nodes.entry(root.clone()).or_insert_with(|| TreeNode {
        key: root.clone(),
        fen: STARTING_FEN.to_string(),
        parent: None,
        move_san: None,
        edges: Vec::new(),
        stats: SplitStats::default(),
        depth: 0,
    });

    let game_count = nodes[&root].stats.aggregate.total;
    let mut tree = OpeningTree {
        perspective: Perspective::Both,
        root,
        nodes,
        game_count,
        included_games: walks.len() as u32,
        excluded_games,
        truncated_games,
        max_depth_plies: options.max_depth_plies,
    };

    tree.sort_edges();
    if options.min_games_per_node > 1 {
        prune(&mut tree, options.min_games_per_node);
    }

    info!(
        games = games.len(),
        included = tree.included_games,
        excluded = tree.excluded_games,
        nodes = tree.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Built opening tree"
    );

    tree
}

fn new_node(record: &WalkRecord, parent: Option<&WalkRecord>) -> TreeNode {
    TreeNode {
        key: record.key.clone(),
        fen: record.snapshot.clone(),
        parent: parent.map(|p| p.key.clone()),
        move_san: record.played.as_ref().map(|m| m.san.clone()),
        edges: Vec::new(),
        stats: SplitStats::default(),
        depth: record.depth,
    }
}

/// Remove non-root nodes seen in fewer than `min_games` games, with the edges into them.
/// Runs after folding so every surviving tally covers the full game set.
fn prune(tree: &mut OpeningTree, min_games: u32) {
    let before = tree.len();
    let root = tree.root.clone();
    tree.nodes
        .retain(|key, node| *key == root || node.stats.aggregate.total >= min_games);
    tree.retain_reachable();
    debug!(before, after = tree.len(), min_games, "Pruned opening tree");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{GameOutcome, PlayerColor};

    fn game(id: &str, moves: &str, result: GameOutcome, color: PlayerColor) -> StoredGame {
        StoredGame::from_san(id, moves, result, color)
    }

    #[test]
    fn test_edges_sorted_by_total_then_move() {
        let games = vec![
            game("a", "d4", GameOutcome::Win, PlayerColor::White),
            game("b", "e4", GameOutcome::Win, PlayerColor::White),
            game("c", "c4", GameOutcome::Loss, PlayerColor::White),
            game("d", "e4", GameOutcome::Draw, PlayerColor::White),
        ];
        let tree = aggregate(&games, &BuildOptions::default());
        let root = tree.root_node().unwrap();
        let moves: Vec<&str> = root.edges.iter().map(|e| e.san.as_str()).collect();
        assert_eq!(moves, vec!["e4", "c4", "d4"]);
    }

    #[test]
    fn test_repetition_back_to_start_is_cut() {
        let games = vec![game(
            "shuffle",
            "Nf3 Nf6 Ng1 Ng8 e4",
            GameOutcome::Draw,
            PlayerColor::White,
        )];
        let tree = aggregate(&games, &BuildOptions::default());

        assert_eq!(tree.truncated_games, 1);
        assert_eq!(tree.included_games, 1);
        // start, Nf3, Nf6, Ng1; returning to the start position ends the walk
        assert_eq!(tree.len(), 4);
        let root = tree.root_node().unwrap();
        assert_eq!(root.stats.aggregate.total, 1);
        for node in tree.nodes.values() {
            for edge in &node.edges {
                assert_eq!(tree.nodes[&edge.target].depth, node.depth + 1);
            }
        }
    }

    #[test]
    fn test_empty_walks_leave_bare_root() {
        let games = vec![game("bad", "e5", GameOutcome::Win, PlayerColor::White)];
        let tree = aggregate(&games, &BuildOptions::default());
        assert_eq!(tree.excluded_games, 1);
        assert_eq!(tree.included_games, 0);
        assert_eq!(tree.game_count, 0);
        assert_eq!(tree.len(), 1);
        assert!(tree.root_node().unwrap().edges.is_empty());
    }
}
