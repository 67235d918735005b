//! Configuration Module
//!
//! Handles loading backend configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::ShardDepth;
use crate::error::Result;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the backend to open through the registry
    pub backend: String,
    /// Default TTL in seconds, used when an entry is added with a zero TTL
    pub default_ttl: u64,
    /// Memory backend sweep interval in seconds
    pub cleanup_interval: u64,
    /// Root directory of the file backend
    pub cache_dir: PathBuf,
    /// File name suffix of the file backend's entries
    pub file_suffix: String,
    /// Number of hash-derived directory levels (0, 1 or 2)
    pub shard_depth: u8,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - Backend name (default: memory)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `CACHE_DIR` - File backend root (default: ./cache)
    /// - `CACHE_FILE_SUFFIX` - File backend suffix (default: .cache)
    /// - `CACHE_SHARD_DEPTH` - File backend shard depth (default: 2)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env::var("CACHE_BACKEND").unwrap_or(defaults.backend),
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
            cache_dir: env::var_os("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            file_suffix: env::var("CACHE_FILE_SUFFIX").unwrap_or(defaults.file_suffix),
            shard_depth: env::var("CACHE_SHARD_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.shard_depth),
        }
    }

    /// Options for the memory backend.
    pub fn memory(&self) -> MemoryConfig {
        MemoryConfig {
            default_expiration: Duration::from_secs(self.default_ttl),
            cleanup_interval: Duration::from_secs(self.cleanup_interval),
        }
    }

    /// Options for the file backend. Fails on an unsupported shard depth.
    pub fn file(&self) -> Result<FileConfig> {
        Ok(FileConfig {
            root_path: self.cache_dir.clone(),
            file_suffix: self.file_suffix.clone(),
            shard_depth: ShardDepth::try_from(self.shard_depth)?,
            default_expiration: Duration::from_secs(self.default_ttl),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            default_ttl: 300,
            cleanup_interval: 60,
            cache_dir: PathBuf::from("./cache"),
            file_suffix: ".cache".to_string(),
            shard_depth: 2,
        }
    }
}

// == Memory Config ==
/// Construction options of [`MemoryCache`](crate::cache::MemoryCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig {
    pub default_expiration: Duration,
    /// Zero disables the sweeper
    pub cleanup_interval: Duration,
}

// == File Config ==
/// Construction options of [`FileCache`](crate::cache::FileCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub root_path: PathBuf,
    pub file_suffix: String,
    pub shard_depth: ShardDepth,
    pub default_expiration: Duration,
}

impl FileConfig {
    /// Options rooted at `root_path` with the default suffix, two shard levels
    /// and a five minute default TTL.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            file_suffix: ".cache".to_string(),
            shard_depth: ShardDepth::Two,
            default_expiration: Duration::from_secs(300),
        }
    }
}
