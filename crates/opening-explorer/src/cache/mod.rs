//! Two independent cache tiers, consulted in order by the orchestrator:
//! the resident tree (plus lazily derived projections), then the on-disk store.

pub mod persistent;
pub mod resident;

pub use persistent::DiskCache;
pub use resident::{ResidentCache, ResidentTree};
