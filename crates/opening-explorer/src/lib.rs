//! Opening explorer tree engine.
//!
//! Builds a move tree keyed by canonical position from a player's games,
//! tallies results per node and per move (overall and by the color the player
//! held), and serves per-color views of it. Builds run off the caller's
//! thread and are cached in memory and on disk by content hash.

pub mod aggregate;
pub mod cache;
pub mod canonical;
pub mod config;
pub mod error;
pub mod hash;
pub mod orchestrator;
pub mod projection;
pub mod stats;
pub mod tree;
pub mod walker;

pub use aggregate::aggregate;
pub use canonical::{canonicalize, starting_key, PositionKey};
pub use config::{BuildOptions, ExplorerConfig};
pub use error::{BuildError, CacheError, ValidationError};
pub use hash::{content_hash, ContentHash};
pub use orchestrator::{BuildPhase, ExplorerStats, OpeningExplorer, TreeStatus};
pub use projection::{project, Perspective};
pub use stats::{SplitStats, Stats};
pub use tree::{MoveEdge, OpeningTree, TreeNode};
pub use walker::{walk, WalkRecord};
