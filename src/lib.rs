//! TTL Cache - pluggable key-value caching
//!
//! One [`Cache`] contract, two backends: [`MemoryCache`] keeps entries in a
//! locked map and sweeps expired ones in the background; [`FileCache`] stores
//! each entry in a file addressed by the SHA-256 digest of its key. A
//! [`BackendRegistry`] picks a backend by name at runtime.

pub mod cache;
pub mod config;
pub mod error;
pub mod registry;
pub mod tasks;

pub use cache::{
    Cache, CacheEntry, CacheStats, FileCache, MemoryCache, ShardDepth, SweeperHandle,
};
pub use config::{Config, FileConfig, MemoryConfig};
pub use error::{CacheError, Result};
pub use registry::BackendRegistry;
