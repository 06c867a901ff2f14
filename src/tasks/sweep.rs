//! Expiration Sweep Task
//!
//! Background task that periodically sweeps lapsed entries out of a cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::EnvelopeCache;
use crate::raw::RawStore;

/// Spawns a background task that periodically calls `sweep_expired`.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. `sweep_expired` logs its own results.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(EnvelopeCache::new(store, clock));
/// let sweep_handle = spawn_sweep_task(cache.clone(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<S>(cache: Arc<EnvelopeCache<S>>, sweep_interval_secs: u64) -> JoinHandle<()>
where
    S: RawStore + 'static,
{
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiration sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;
            cache.sweep_expired();
        }
    })
}
