//! Explorer error types

use thiserror::Error;

/// Input contract violations, rejected before any hashing or dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No games supplied")]
    EmptyGameSet,

    #[error("Unknown perspective '{0}' (expected 'white', 'black' or 'both')")]
    UnknownPerspective(String),
}

/// Failure of the tree build itself. Cached state is never touched by one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("No async runtime available to host tree builds")]
    NoRuntime,

    #[error("Tree build failed: {0}")]
    WorkerFailed(String),
}

/// Persistent tier failures. The orchestrator logs these and treats them as misses.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Corrupt cache entry {path}: {reason}")]
    Corrupt { path: String, reason: String },
}
