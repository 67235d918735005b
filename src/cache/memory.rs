//! Memory Backend
//!
//! In-process cache over a [`MemoryStore`] with a background sweep task.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{effective_ttl, Cache, CacheStats, MemoryStore};
use crate::config::MemoryConfig;
use crate::error::Result;
use crate::tasks::{spawn_cleanup_task, spawn_cleanup_thread};

// == Sweeper Handle ==
/// Join handle of a sweeper, handed back by [`MemoryCache::stop_maintenance`].
#[derive(Debug)]
pub enum SweeperHandle {
    /// Task spawned on the caller's tokio runtime
    Task(JoinHandle<()>),
    /// Dedicated thread driving its own runtime, used when there was no
    /// ambient runtime at start
    Thread(thread::JoinHandle<()>),
}

impl SweeperHandle {
    pub fn is_finished(&self) -> bool {
        match self {
            SweeperHandle::Task(handle) => handle.is_finished(),
            SweeperHandle::Thread(handle) => handle.is_finished(),
        }
    }

    /// Waits for the sweeper to exit.
    pub async fn wait(self) {
        match self {
            SweeperHandle::Task(handle) => {
                if let Err(err) = handle.await {
                    warn!("TTL cleanup task ended abnormally: {}", err);
                }
            }
            SweeperHandle::Thread(handle) => {
                let joined = tokio::task::spawn_blocking(move || handle.join()).await;
                if !matches!(joined, Ok(Ok(()))) {
                    warn!("TTL cleanup thread ended abnormally");
                }
            }
        }
    }
}

/// Running sweeper and the sender that stops it.
#[derive(Debug)]
struct Maintenance {
    stop: oneshot::Sender<()>,
    sweeper: SweeperHandle,
}

// == Memory Cache ==
/// In-memory backend with time-based expiration.
///
/// Construction starts the sweep task on the ambient tokio runtime, or on a
/// dedicated thread when called outside of one. Stop it
/// deterministically with [`stop_maintenance`](Self::stop_maintenance) or
/// [`shutdown`](Self::shutdown). Dropping the cache also signals the task,
/// but the task only notices at its next poll, so teardown that must be
/// complete before continuing should use `shutdown`.
#[derive(Debug)]
pub struct MemoryCache<V> {
    store: Arc<MemoryStore<V>>,
    default_expiration: Duration,
    cleanup_interval: Duration,
    maintenance: Mutex<Option<Maintenance>>,
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates the cache and starts its sweeper.
    pub fn new(config: MemoryConfig) -> Self {
        let cache = Self {
            store: Arc::new(MemoryStore::new()),
            default_expiration: config.default_expiration,
            cleanup_interval: config.cleanup_interval,
            maintenance: Mutex::new(None),
        };
        cache.start_maintenance();
        cache
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Runs one sweep immediately, outside the background schedule.
    pub fn sweep_now(&self) -> usize {
        self.store.sweep_expired()
    }

    pub fn is_maintenance_running(&self) -> bool {
        self.maintenance
            .lock()
            .as_ref()
            .is_some_and(|m| !m.sweeper.is_finished())
    }

    // == Stop Maintenance ==
    /// Signals the sweeper to stop and hands back its join handle.
    ///
    /// Returns `None` if no sweeper was running.
    pub fn stop_maintenance(&self) -> Option<SweeperHandle> {
        let maintenance = self.maintenance.lock().take()?;
        // The task may already be gone if its runtime shut down
        let _ = maintenance.stop.send(());
        Some(maintenance.sweeper)
    }

    // == Shutdown ==
    /// Stops the sweeper and waits for it to finish.
    pub async fn shutdown(&self) {
        if let Some(sweeper) = self.stop_maintenance() {
            sweeper.wait().await;
        }
    }
}

impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Option<V> {
        self.store.get(key)
    }

    fn add(&self, key: &str, value: V, ttl: Duration) -> Result<()> {
        let ttl = effective_ttl(ttl, self.default_expiration);
        self.store.set(key, value, ttl);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key)
    }

    fn flush(&self) -> Result<()> {
        let removed = self.store.clear();
        debug!("Flushed {} entries from memory cache", removed);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.store.contains_live(key)
    }

    // == Start Maintenance ==
    /// Spawns the sweep task unless one is already running.
    ///
    /// A zero cleanup interval disables sweeping. Outside a tokio runtime the
    /// same loop runs on a dedicated `ttl-cache-sweeper` thread.
    fn start_maintenance(&self) {
        if self.cleanup_interval.is_zero() {
            debug!("Cleanup interval is zero, sweeper disabled");
            return;
        }

        let mut slot = self.maintenance.lock();
        if slot.as_ref().is_some_and(|m| !m.sweeper.is_finished()) {
            return;
        }

        let (stop, stop_rx) = oneshot::channel();
        let store = Arc::clone(&self.store);
        let sweeper = match Handle::try_current() {
            Ok(runtime) => SweeperHandle::Task(spawn_cleanup_task(
                &runtime,
                store,
                self.cleanup_interval,
                stop_rx,
            )),
            Err(_) => match spawn_cleanup_thread(store, self.cleanup_interval, stop_rx) {
                Ok(handle) => SweeperHandle::Thread(handle),
                Err(err) => {
                    warn!(
                        "Failed to start sweeper thread, expired entries will not be swept: {}",
                        err
                    );
                    return;
                }
            },
        };
        *slot = Some(Maintenance { stop, sweeper });
        info!("Memory cache sweeper started");
    }

    fn stats(&self) -> CacheStats {
        self.store.stats().snapshot()
    }
}

impl<V> Drop for MemoryCache<V> {
    fn drop(&mut self) {
        if let Some(maintenance) = self.maintenance.get_mut().take() {
            let _ = maintenance.stop.send(());
        }
    }
}
