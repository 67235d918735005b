//! File Backend
//!
//! Persists every entry as its own file at a path derived from the SHA-256
//! digest of the key. The directory tree is the index; nothing is kept in
//! memory beyond the layout and counters.
//!
//! The instance lock serializes operations issued through one `FileCache`.
//! Other instances or processes sharing the same root are not coordinated
//! with. Every write goes to its own uniquely named temporary file that is
//! renamed over the entry, so concurrent writers race only on which complete
//! entry wins and a reader never observes a partial one.

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::{effective_ttl, Cache, CacheEntry, CacheStats, PathLayout, StatsRecorder};
use crate::config::FileConfig;
use crate::error::{CacheError, Result};

// == File Cache ==
/// Filesystem backend storing `V` as JSON-encoded [`CacheEntry`] files.
#[derive(Debug)]
pub struct FileCache<V> {
    layout: PathLayout,
    default_expiration: Duration,
    lock: RwLock<()>,
    stats: StatsRecorder,
    _value: PhantomData<fn() -> V>,
}

impl<V> FileCache<V>
where
    V: Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Opens a file cache, creating the root directory if it is missing.
    pub fn new(config: FileConfig) -> Result<Self> {
        fs::create_dir_all(&config.root_path)
            .map_err(|e| CacheError::io(&config.root_path, e))?;

        info!(
            "File cache opened at {} (shard depth {:?})",
            config.root_path.display(),
            config.shard_depth
        );

        Ok(Self {
            layout: PathLayout::new(config.root_path, config.file_suffix, config.shard_depth),
            default_expiration: config.default_expiration,
            lock: RwLock::new(()),
            stats: StatsRecorder::new(),
            _value: PhantomData,
        })
    }

    pub fn layout(&self) -> &PathLayout {
        &self.layout
    }

    /// Where the entry for `key` lives. Pure; creates nothing.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.layout.path_for(key)
    }

    // == Read Entry ==
    /// Loads and decodes the entry at `path`.
    ///
    /// Missing, unreadable and undecodable files all come back as `None`;
    /// a corrupt entry is just a miss.
    fn read_entry(&self, path: &Path) -> Option<CacheEntry<V>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry<V>>(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Ignoring undecodable cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    // == Write Entry ==
    /// Writes `bytes` to `path` via a temporary sibling and a rename.
    ///
    /// The temporary file is removed again if the rename fails.
    fn write_entry(path: &Path, bytes: &[u8]) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| CacheError::io(parent, e))?;
        tmp.write_all(bytes)
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(path)
            .map_err(|e| CacheError::io(path, e.error))?;
        Ok(())
    }

    /// Expiration of the entry at `path` without decoding its value, so
    /// entries written with another value type are judged too.
    ///
    /// `None` means the file is gone; `Some(None)` means it is not an entry.
    fn peek_expired(path: &Path) -> Option<Option<bool>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return Some(None);
            }
        };
        Some(
            serde_json::from_slice::<CacheEntry<serde_json::Value>>(&bytes)
                .ok()
                .map(|entry| entry.is_expired()),
        )
    }

    // == Purge ==
    /// Removes every entry file under the root. Returns the number removed.
    ///
    /// Unlike [`flush`](Cache::flush), which leaves the tree untouched, this
    /// walks the whole root.
    pub fn purge(&self) -> Result<usize> {
        let _guard = self.lock.write();
        let removed = self.remove_entries_where(|_| true)?;
        info!("Purged {} entries from {}", removed, self.layout.root().display());
        Ok(removed)
    }

    // == Purge Expired ==
    /// Removes entry files that are expired or are not entries at all.
    ///
    /// Only the envelope is inspected, so live entries written by an instance
    /// with a different value type on the same root are kept.
    pub fn purge_expired(&self) -> Result<usize> {
        let _guard = self.lock.write();
        let removed = self.remove_entries_where(|path| {
            // Unreadable or corrupt files count as expired
            Self::peek_expired(path).is_some_and(|expired| expired.unwrap_or(true))
        })?;
        if removed > 0 {
            info!("Purged {} expired entries", removed);
        } else {
            debug!("No expired entries to purge");
        }
        Ok(removed)
    }

    /// Walks the entry files of the layout and removes those matching `predicate`.
    fn remove_entries_where<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&Path) -> bool,
    {
        let depth = self.layout.depth().levels() + 1;
        let mut removed = 0;

        for item in WalkDir::new(self.layout.root())
            .min_depth(depth)
            .max_depth(depth)
        {
            let item = item.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.layout.root().to_path_buf());
                CacheError::io(path, io::Error::from(e))
            })?;

            let path = item.path();
            if !item.file_type().is_file() || !self.layout.is_entry_path(path) {
                continue;
            }
            if !predicate(path) {
                continue;
            }

            match fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io(path, e)),
            }
        }

        Ok(removed)
    }
}

impl<V> Cache<V> for FileCache<V>
where
    V: Serialize + DeserializeOwned,
{
    fn get(&self, key: &str) -> Option<V> {
        let path = self.path_for(key);
        let entry = {
            let _guard = self.lock.read();
            self.read_entry(&path)
        };

        // Expired files stay on disk until deleted or purged
        let value = entry
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value);
        self.stats.record_lookup(value.is_some());
        value
    }

    fn add(&self, key: &str, value: V, ttl: Duration) -> Result<()> {
        let ttl = effective_ttl(ttl, self.default_expiration);
        let entry = CacheEntry::new(value, ttl);
        let bytes = serde_json::to_vec(&entry)?;
        let path = self.path_for(key);

        {
            let _guard = self.lock.write();
            Self::write_entry(&path, &bytes)?;
        }

        debug!("Wrote cache entry {}", path.display());
        self.stats.record_write();
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        let _guard = self.lock.write();

        match fs::remove_file(&path) {
            Ok(()) => {
                self.stats.record_delete();
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound(key.to_string())),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    /// No-op: entry files are left in place. Use [`FileCache::purge`] to
    /// reclaim the directory tree.
    fn flush(&self) -> Result<()> {
        debug!("Flush is a no-op for the file cache");
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        let path = self.path_for(key);
        let _guard = self.lock.read();
        self.read_entry(&path).is_some_and(|entry| entry.is_live())
    }

    fn start_maintenance(&self) {}

    fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}
