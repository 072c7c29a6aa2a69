//! Bounded execution substrate for logical workers
//!
//! A dedicated multi-thread runtime with a capped number of real threads
//! executes an effectively unbounded number of logical worker tasks: a task
//! that suspends on a timer or I/O releases its pool thread for the
//! suspension. Queueing is unbounded; no backpressure is applied at this
//! layer, capacity planning belongs to the caller.

use crate::{Error, Result};
use std::future::Future;
use std::sync::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

/// Hard cap on real pool threads, regardless of requested concurrency
pub const MAX_POOL_THREADS: usize = 200;

/// A worker pool bounded in real threads but not in logical tasks
///
/// Created per schedule run and shut down when the schedule completes or the
/// group is interrupted. Shutdown is idempotent.
pub struct BoundedExecutor {
    handle: Handle,
    runtime: Mutex<Option<Runtime>>,
}

impl BoundedExecutor {
    /// Build a pool with `min(requested, MAX_POOL_THREADS)` real threads
    pub fn new(requested_threads: usize) -> Result<Self> {
        let threads = requested_threads.clamp(1, MAX_POOL_THREADS);
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads)
            .thread_name("cadence-worker")
            .enable_all()
            .build()
            .map_err(|e| Error::Other(format!("failed to build worker pool: {e}")))?;
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
        })
    }

    /// Submit a logical task. Returns `None` if the pool is already shut
    /// down, in which case the task is dropped without running.
    pub fn spawn<F>(&self, future: F) -> Option<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let guard = self.runtime.lock().ok()?;
        if guard.is_none() {
            return None;
        }
        Some(self.handle.spawn(future))
    }

    /// Shut the pool down without waiting for in-flight tasks
    ///
    /// Callers cancel workers cooperatively first, so nothing observable is
    /// lost. Safe to call from async context, and a no-op when repeated.
    pub fn shutdown(&self) {
        let runtime = self.runtime.lock().ok().and_then(|mut slot| slot.take());
        if let Some(runtime) = runtime {
            runtime.shutdown_background();
        }
    }

    /// Whether the pool has been shut down
    pub fn is_shutdown(&self) -> bool {
        self.runtime.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }
}

impl Drop for BoundedExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
