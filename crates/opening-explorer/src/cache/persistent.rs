//! On-disk tier: "both" trees stored as bincode files named by content hash.
//!
//! Each file is a small header (format version, hash, save time) followed by
//! the tree. Only the most recently saved entries are kept.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use bincode::Options;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::CacheError;
use crate::hash::ContentHash;
use crate::tree::OpeningTree;

const FORMAT_VERSION: u32 = 1;
const ENTRY_EXTENSION: &str = "bin";

#[derive(Debug, Serialize, Deserialize)]
struct EntryHeader {
    format_version: u32,
    hash: String,
    saved_at_ms: i64,
}

#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    capacity: usize,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            dir: dir.into(),
            capacity,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, hash: &ContentHash) -> PathBuf {
        self.dir.join(format!("{hash}.{ENTRY_EXTENSION}"))
    }

    /// Load the tree stored under `hash`. A missing file is `Ok(None)`.
    pub fn load(&self, hash: &ContentHash) -> Result<Option<OpeningTree>, CacheError> {
        let path = self.entry_path(hash);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let header: EntryHeader = entry_options(len).deserialize_from(&mut reader)?;
        if header.format_version != FORMAT_VERSION || header.hash != hash.as_str() {
            return Err(CacheError::Corrupt {
                path: path.display().to_string(),
                reason: format!(
                    "header v{} for {} does not match v{FORMAT_VERSION} {hash}",
                    header.format_version, header.hash
                ),
            });
        }

        let tree: OpeningTree = entry_options(len).deserialize_from(&mut reader)?;
        Ok(Some(tree))
    }

    /// Save a tree, then evict beyond capacity.
    pub fn store(&self, hash: &ContentHash, tree: &OpeningTree) -> Result<(), CacheError> {
        self.store_at(hash, tree, Utc::now())
    }

    /// Save with an explicit save time. The entry is written to a temporary file
    /// and renamed into place, so a failed write leaves no partial entry behind.
    pub fn store_at(
        &self,
        hash: &ContentHash,
        tree: &OpeningTree,
        saved_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;

        let header = EntryHeader {
            format_version: FORMAT_VERSION,
            hash: hash.as_str().to_string(),
            saved_at_ms: saved_at.timestamp_millis(),
        };

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            bincode::serialize_into(&mut writer, &header)?;
            bincode::serialize_into(&mut writer, tree)?;
            writer.flush()?;
        }
        tmp.persist(self.entry_path(hash)).map_err(|e| e.error)?;

        let evicted = self.evict(hash)?;
        if evicted > 0 {
            tracing::debug!(evicted, dir = %self.dir.display(), "Evicted cached opening trees");
        }
        Ok(())
    }

    /// Remove unreadable entries and everything past the `capacity` newest.
    /// The entry for `keep` ranks first regardless of timestamps.
    pub fn evict(&self, keep: &ContentHash) -> Result<usize, CacheError> {
        let mut entries = self.scan()?;
        entries.sort_by(|a, b| {
            let a_keep = a.stem == keep.as_str();
            let b_keep = b.stem == keep.as_str();
            b_keep
                .cmp(&a_keep)
                .then_with(|| b.saved_at_ms.cmp(&a.saved_at_ms))
                .then_with(|| a.stem.cmp(&b.stem))
        });

        let mut removed = 0;
        for (rank, entry) in entries.iter().enumerate() {
            if rank >= self.capacity || entry.saved_at_ms.is_none() {
                match fs::remove_file(&entry.path) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(removed)
    }

    /// Hashes of readable entries, newest first.
    pub fn entries(&self) -> Result<Vec<String>, CacheError> {
        let mut entries: Vec<ScannedEntry> = self
            .scan()?
            .into_iter()
            .filter(|e| e.saved_at_ms.is_some())
            .collect();
        entries.sort_by(|a, b| b.saved_at_ms.cmp(&a.saved_at_ms));
        Ok(entries.into_iter().map(|e| e.stem).collect())
    }

    fn scan(&self) -> Result<Vec<ScannedEntry>, CacheError> {
        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for dir_entry in dir {
            let path = dir_entry?.path();
            if path.extension() != Some(OsStr::new(ENTRY_EXTENSION)) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(OsStr::to_str).map(str::to_string) else {
                continue;
            };
            let saved_at_ms = read_header(&path)
                .ok()
                .filter(|h| h.format_version == FORMAT_VERSION && h.hash == stem)
                .map(|h| h.saved_at_ms);
            entries.push(ScannedEntry {
                path,
                stem,
                saved_at_ms,
            });
        }
        Ok(entries)
    }
}

struct ScannedEntry {
    path: PathBuf,
    stem: String,
    /// `None` when the header cannot be read.
    saved_at_ms: Option<i64>,
}

/// Same layout `bincode::serialize_into` writes, but no single read may claim
/// more bytes than the file holds, so a corrupt length fails instead of allocating.
fn entry_options(file_len: u64) -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(file_len)
}

fn read_header(path: &Path) -> Result<EntryHeader, CacheError> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    Ok(entry_options(len).deserialize_from(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::config::BuildOptions;
    use crate::hash::content_hash;
    use chess_core::{GameOutcome, PlayerColor, StoredGame};
    use chrono::Duration;

    fn sample(id: &str) -> (ContentHash, OpeningTree) {
        let games = vec![StoredGame::from_san(
            id,
            "e4 c5 Nf3",
            GameOutcome::Win,
            PlayerColor::White,
        )];
        let options = BuildOptions::default();
        (content_hash(&games, &options), aggregate(&games, &options))
    }

    #[test]
    fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), 3);
        let (hash, tree) = sample("1");

        assert!(cache.load(&hash).unwrap().is_none());
        cache.store(&hash, &tree).unwrap();
        assert_eq!(cache.load(&hash).unwrap(), Some(tree));
    }

    #[test]
    fn test_eviction_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), 3);
        let base = Utc::now();

        let mut hashes = Vec::new();
        for i in 0..4 {
            let (hash, tree) = sample(&i.to_string());
            cache
                .store_at(&hash, &tree, base + Duration::seconds(i))
                .unwrap();
            hashes.push(hash);
        }

        let kept = cache.entries().unwrap();
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0], hashes[3].as_str());
        assert!(!kept.contains(&hashes[0].as_str().to_string()));
        assert!(cache.load(&hashes[0]).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_entry_is_an_error_then_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), 3);
        let (hash, tree) = sample("1");
        fs::write(dir.path().join(format!("{hash}.bin")), b"not a tree").unwrap();

        assert!(cache.load(&hash).is_err());

        let (other, other_tree) = sample("2");
        cache.store(&other, &other_tree).unwrap();
        assert_eq!(cache.entries().unwrap(), vec![other.as_str().to_string()]);
        assert!(cache.load(&hash).unwrap().is_none());

        cache.store(&hash, &tree).unwrap();
        assert_eq!(cache.load(&hash).unwrap(), Some(tree));
    }

    /// Header claiming a 1 TiB hash string.
    fn oversized_header() -> Vec<u8> {
        let mut bytes = FORMAT_VERSION.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(1u64 << 40).to_le_bytes());
        bytes.extend_from_slice(b"xxxx");
        bytes
    }

    #[test]
    fn test_oversized_length_is_corrupt_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), 3);
        let (hash, tree) = sample("1");
        fs::write(dir.path().join(format!("{hash}.bin")), oversized_header()).unwrap();

        assert!(matches!(cache.load(&hash), Err(CacheError::Encoding(_))));
        assert!(cache.entries().unwrap().is_empty());

        // Another insert scans the bad header and removes it
        let (other, other_tree) = sample("2");
        cache.store(&other, &other_tree).unwrap();
        assert_eq!(cache.entries().unwrap(), vec![other.as_str().to_string()]);
        assert!(!dir.path().join(format!("{hash}.bin")).exists());

        cache.store(&hash, &tree).unwrap();
        assert_eq!(cache.load(&hash).unwrap(), Some(tree));
    }
}
