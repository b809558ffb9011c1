//! Explorer configuration from environment variables

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DEPTH_PLIES: usize = 60;
pub const DEFAULT_MIN_GAMES_PER_NODE: u32 = 1;
pub const DEFAULT_CACHE_DIR: &str = "data/opening_trees";
pub const DEFAULT_CACHE_CAPACITY: usize = 3;

/// Options that shape the tree. Both are part of the content hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Plies replayed per game; later moves are ignored.
    pub max_depth_plies: usize,
    /// Non-root nodes reached by fewer games are pruned. 1 disables pruning.
    pub min_games_per_node: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_depth_plies: DEFAULT_MAX_DEPTH_PLIES,
            min_games_per_node: DEFAULT_MIN_GAMES_PER_NODE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExplorerConfig {
    pub build: BuildOptions,

    /// Directory of the persistent tree cache; `None` keeps trees in memory only.
    pub cache_dir: Option<PathBuf>,

    /// Persistent entries retained, newest first.
    pub cache_capacity: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            build: BuildOptions::default(),
            cache_dir: Some(PathBuf::from(DEFAULT_CACHE_DIR)),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl ExplorerConfig {
    /// Config without a persistent tier.
    pub fn in_memory() -> Self {
        Self {
            cache_dir: None,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let cache_dir = if env::var("EXPLORER_DISABLE_DISK_CACHE").is_ok() {
            None
        } else {
            Some(
                env::var("EXPLORER_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR)),
            )
        };

        Self {
            build: BuildOptions {
                max_depth_plies: env::var("EXPLORER_MAX_DEPTH_PLIES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_DEPTH_PLIES),
                min_games_per_node: env::var("EXPLORER_MIN_GAMES_PER_NODE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MIN_GAMES_PER_NODE),
            },
            cache_dir,
            cache_capacity: env::var("EXPLORER_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CACHE_CAPACITY),
        }
    }
}
