//! Backend Registry
//!
//! Maps backend names to constructors. The application owns its registry and
//! hands it to whoever needs to open a cache; there is no process-wide table.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::cache::{Cache, FileCache, MemoryCache};
use crate::config::Config;
use crate::error::{CacheError, Result};

/// Name of the built-in memory backend.
pub const MEMORY_BACKEND: &str = "memory";
/// Name of the built-in file backend.
pub const FILE_BACKEND: &str = "file";

/// Builds a fresh backend instance.
pub type Constructor<V> = Box<dyn Fn() -> Result<Box<dyn Cache<V>>> + Send + Sync>;

// == Backend Registry ==
pub struct BackendRegistry<V> {
    constructors: HashMap<String, Constructor<V>>,
}

impl<V> Default for BackendRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for BackendRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}

impl<V> BackendRegistry<V> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    // == Register ==
    /// Registers `constructor` under `name`.
    ///
    /// Fails if the name is empty or already taken.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Fn() -> Result<Box<dyn Cache<V>>> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(CacheError::InvalidConfig(
                "backend name cannot be empty".to_string(),
            ));
        }
        if self.constructors.contains_key(&name) {
            return Err(CacheError::DuplicateBackend(name));
        }
        self.constructors.insert(name, Box::new(constructor));
        Ok(())
    }

    // == Create ==
    /// Builds a new instance of the backend registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Cache<V>>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| CacheError::UnknownBackend(name.to_string()))?;
        constructor()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<V> BackendRegistry<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    // == Built-in Backends ==
    /// Registry with `"memory"` and `"file"` wired to `config`.
    ///
    /// The file backend's options are validated here so a bad shard depth is
    /// reported before anything is opened.
    pub fn with_builtin(config: &Config) -> Result<Self> {
        let memory = config.memory();
        let file = config.file()?;

        let mut registry = Self::new();
        registry.register(MEMORY_BACKEND, move || {
            Ok(Box::new(MemoryCache::<V>::new(memory)) as Box<dyn Cache<V>>)
        })?;
        registry.register(FILE_BACKEND, move || {
            Ok(Box::new(FileCache::<V>::new(file.clone())?) as Box<dyn Cache<V>>)
        })?;
        Ok(registry)
    }

    // == Open ==
    /// Opens the backend named by `config.backend`.
    pub fn open(config: &Config) -> Result<Box<dyn Cache<V>>> {
        let cache = Self::with_builtin(config)?.create(&config.backend)?;
        info!("Opened {} cache backend", config.backend);
        Ok(cache)
    }
}
