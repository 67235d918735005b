//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries out of a memory store.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::MemoryStore;

/// Spawns a background task that sweeps expired entries on a fixed interval.
///
/// The loop waits for either the next tick or the stop signal. A tick runs
/// [`MemoryStore::sweep_expired`]; the stop signal (or the sender being
/// dropped) ends the loop and no further sweeps occur.
///
/// # Arguments
/// * `runtime` - Runtime to spawn onto
/// * `store` - Shared store to sweep
/// * `interval` - Time between sweeps, must be non-zero
/// * `stop` - Receiving half of the stop signal
///
/// # Example
/// ```ignore
/// let (stop_tx, stop_rx) = oneshot::channel();
/// let handle = spawn_cleanup_task(&Handle::current(), store.clone(), interval, stop_rx);
/// // Later, during shutdown:
/// let _ = stop_tx.send(());
/// handle.await?;
/// ```
pub fn spawn_cleanup_task<V>(
    runtime: &Handle,
    store: Arc<MemoryStore<V>>,
    interval: Duration,
    mut stop: oneshot::Receiver<()>,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    runtime.spawn(async move {
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.sweep_expired();
                    if removed > 0 {
                        info!("TTL cleanup: removed {} expired entries", removed);
                    } else {
                        debug!("TTL cleanup: no expired entries found");
                    }
                }
                _ = &mut stop => {
                    info!("TTL cleanup task stopped");
                    break;
                }
            }
        }
    })
}

/// Runs the cleanup loop on a dedicated thread with its own current-thread runtime.
///
/// Used when the caller has no tokio runtime. The thread exits once the loop
/// observes the stop signal.
pub fn spawn_cleanup_thread<V>(
    store: Arc<MemoryStore<V>>,
    interval: Duration,
    stop: oneshot::Receiver<()>,
) -> io::Result<thread::JoinHandle<()>>
where
    V: Send + Sync + 'static,
{
    let runtime = Builder::new_current_thread().enable_time().build()?;

    thread::Builder::new()
        .name("ttl-cache-sweeper".to_string())
        .spawn(move || {
            let task = spawn_cleanup_task(runtime.handle(), store, interval, stop);
            if let Err(err) = runtime.block_on(task) {
                warn!("TTL cleanup thread ended abnormally: {}", err);
            }
        })
}
