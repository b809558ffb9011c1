//! The explorer tree: nodes stored by position key, edges refer to children by key.
//!
//! Transpositions are shared nodes reachable from several parents. Every edge
//! leads from depth `d` to depth `d + 1`, so the structure stays acyclic.

use std::collections::{HashMap, HashSet};

use chess_core::normalize_san;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::canonical::{canonicalize, PositionKey};
use crate::projection::Perspective;
use crate::stats::{SplitStats, Stats};

/// A move played from a node. Its stats count games that played this move from
/// this position, not everything that reached the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEdge {
    pub san: String,
    pub uci: String,
    pub target: PositionKey,
    pub stats: SplitStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub key: PositionKey,
    /// Full FEN of the first game that reached this position.
    pub fen: String,
    pub parent: Option<PositionKey>,
    pub move_san: Option<String>,
    /// Most played first.
    pub edges: Vec<MoveEdge>,
    pub stats: SplitStats,
    pub depth: usize,
}

impl TreeNode {
    /// The edge for a move, accepting SAN with or without a check suffix.
    pub fn edge(&self, move_san: &str) -> Option<&MoveEdge> {
        let san = normalize_san(move_san);
        self.edges.iter().find(|e| e.san == san)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningTree {
    pub perspective: Perspective,
    pub root: PositionKey,
    pub nodes: HashMap<PositionKey, TreeNode>,
    /// Games counted at the root of this view.
    pub game_count: u32,
    pub included_games: u32,
    /// Games whose moves failed to replay.
    pub excluded_games: u32,
    /// Included games cut short on reaching a position first seen at a shallower ply.
    pub truncated_games: u32,
    pub max_depth_plies: usize,
}

impl OpeningTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_node(&self) -> Option<&TreeNode> {
        self.nodes.get(&self.root)
    }

    /// Look up a node by position key or full FEN.
    pub fn get_node(&self, position: &str) -> Option<&TreeNode> {
        self.nodes.get(&canonicalize(position))
    }

    pub fn get_node_after_move(&self, position: &str, move_san: &str) -> Option<&TreeNode> {
        let edge = self.get_node(position)?.edge(move_san)?;
        self.nodes.get(&edge.target)
    }

    /// Moves from the root to `position` along recorded parents.
    pub fn get_move_path(&self, position: &str) -> Option<Vec<String>> {
        let mut node = self.get_node(position)?;
        let mut path = Vec::with_capacity(node.depth);

        while let (Some(parent), Some(mv)) = (&node.parent, &node.move_san) {
            path.push(mv.clone());
            node = self.nodes.get(parent)?;
            if path.len() > self.nodes.len() {
                return None;
            }
        }

        if node.key != self.root {
            return None;
        }
        path.reverse();
        Some(path)
    }

    /// Most played continuation from the root.
    pub fn main_line(&self) -> Vec<String> {
        let mut line = Vec::new();
        let mut current = self.root_node();

        while let Some(edge) = current.and_then(|node| node.edges.first()) {
            line.push(edge.san.clone());
            current = self.nodes.get(&edge.target);
        }

        line
    }

    /// Node plus its moves in the shape the dashboard consumes.
    pub fn node_json(&self, position: &str) -> Option<JsonValue> {
        let node = self.get_node(position)?;

        let children: Vec<JsonValue> = node
            .edges
            .iter()
            .map(|edge| {
                let fen = self
                    .nodes
                    .get(&edge.target)
                    .map(|child| child.fen.as_str())
                    .unwrap_or_else(|| edge.target.as_str());
                stats_json(&edge.stats.aggregate, serde_json::json!({
                    "move": edge.san,
                    "uci": edge.uci,
                    "fen": fen,
                }))
            })
            .collect();

        Some(stats_json(&node.stats.aggregate, serde_json::json!({
            "move": node.move_san.as_deref().unwrap_or("start"),
            "fen": node.fen,
            "depth": node.depth,
            "perspective": self.perspective.as_str(),
            "children": children,
        })))
    }

    pub(crate) fn sort_edges(&mut self) {
        for node in self.nodes.values_mut() {
            node.edges.sort_by(|a, b| {
                b.stats
                    .aggregate
                    .total
                    .cmp(&a.stats.aggregate.total)
                    .then_with(|| a.san.cmp(&b.san))
            });
        }
    }

    /// Drop edges into missing nodes, then every node the root can no longer reach.
    /// Nodes whose recorded parent disappeared are re-parented to their first
    /// surviving parent in breadth-first order.
    pub(crate) fn retain_reachable(&mut self) {
        let present: HashSet<PositionKey> = self.nodes.keys().cloned().collect();
        for node in self.nodes.values_mut() {
            node.edges.retain(|edge| present.contains(&edge.target));
        }

        if !self.nodes.contains_key(&self.root) {
            self.nodes.clear();
            return;
        }

        let mut reached: HashSet<PositionKey> = HashSet::from([self.root.clone()]);
        let mut discovered_by: HashMap<PositionKey, (PositionKey, String)> = HashMap::new();
        let mut queue = vec![self.root.clone()];
        let mut next = 0;

        while let Some(key) = queue.get(next).cloned() {
            next += 1;
            let Some(node) = self.nodes.get(&key) else { continue };
            for edge in &node.edges {
                if reached.insert(edge.target.clone()) {
                    discovered_by.insert(edge.target.clone(), (key.clone(), edge.san.clone()));
                    queue.push(edge.target.clone());
                }
            }
        }

        self.nodes.retain(|key, _| reached.contains(key));

        let orphaned: Vec<PositionKey> = discovered_by
            .keys()
            .filter(|key| !self.parent_edge_survives(key))
            .cloned()
            .collect();
        for key in orphaned {
            if let (Some(node), Some((parent, san))) =
                (self.nodes.get_mut(&key), discovered_by.remove(&key))
            {
                node.parent = Some(parent);
                node.move_san = Some(san);
            }
        }
    }

    fn parent_edge_survives(&self, key: &PositionKey) -> bool {
        let Some(node) = self.nodes.get(key) else {
            return true;
        };
        match (&node.parent, &node.move_san) {
            (Some(parent), Some(san)) => self
                .nodes
                .get(parent)
                .and_then(|p| p.edge(san))
                .is_some_and(|edge| edge.target == *key),
            _ => false,
        }
    }
}

fn stats_json(stats: &Stats, mut value: JsonValue) -> JsonValue {
    let win_rate = (stats.win_rate() * 10.0).round() / 10.0;
    value["games"] = stats.total.into();
    value["wins"] = stats.wins.into();
    value["losses"] = stats.losses.into();
    value["draws"] = stats.draws.into();
    value["winRate"] = win_rate.into();
    value
}
