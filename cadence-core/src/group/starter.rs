//! Launch driver: turns the timestamp stream into running workers
//!
//! One driver task per schedule run, executing on the housekeeping runtime
//! so that scheduling precision never competes with worker execution for
//! pool threads. Sleeps are anchored to the schedule start instant, so a
//! late launch self-corrects instead of accumulating delay or bursting.

use super::executor::BoundedExecutor;
use super::worker::{CancelToken, Worker, WorkerContext};
use crate::arrivals::ScheduleProcessGenerator;
use crate::timing;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Factory contract supplied by the embedding harness
pub type WorkerFactory = Box<dyn FnMut(usize) -> Arc<dyn Worker> + Send>;

/// One launched worker still believed to be running
pub(crate) struct ActiveWorker {
    pub(crate) name: String,
    pub(crate) cancel: CancelToken,
    /// Attached after spawn; absent if the worker finished first
    pub(crate) join: Option<JoinHandle<()>>,
}

/// Internally synchronized set of in-flight workers
///
/// The launch driver inserts, finish callbacks remove, and group stop paths
/// iterate; the map's own lock is the only synchronization required.
#[derive(Default)]
pub(crate) struct ActiveSet {
    entries: Mutex<HashMap<usize, ActiveWorker>>,
}

impl ActiveSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().map(|map| map.len()).unwrap_or(0)
    }

    fn insert(&self, index: usize, entry: ActiveWorker) {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(index, entry);
        }
    }

    pub(crate) fn remove(&self, index: usize) {
        if let Ok(mut map) = self.entries.lock() {
            map.remove(&index);
        }
    }

    fn attach_join(&self, index: usize, join: JoinHandle<()>) {
        if let Ok(mut map) = self.entries.lock() {
            if let Some(entry) = map.get_mut(&index) {
                entry.join = Some(join);
            }
            // Entry already gone: the worker finished before we got here
        }
    }

    /// Graceful stop of every active worker; entries stay until each worker
    /// observes the flag and finishes
    pub(crate) fn stop_all(&self) {
        if let Ok(map) = self.entries.lock() {
            for entry in map.values() {
                tracing::info!(worker = %entry.name, "gracefully stopping worker");
                entry.cancel.stop();
            }
        }
    }

    /// Force-stop: cooperative stop, then interrupt, then cancel the future
    pub(crate) fn interrupt_all(&self) {
        let drained: Vec<ActiveWorker> = match self.entries.lock() {
            Ok(mut map) => map.drain().map(|(_, entry)| entry).collect(),
            Err(_) => Vec::new(),
        };
        for entry in drained {
            entry.cancel.stop();
            let interrupted = entry.cancel.interrupt();
            if !interrupted {
                tracing::info!(
                    worker = %entry.name,
                    "worker had no interruptible operation in flight"
                );
            }
            if let Some(join) = entry.join {
                join.abort();
            }
            tracing::info!(worker = %entry.name, interrupted, "terminated worker");
        }
    }
}

/// Completion latch for [`wait_finished`](crate::group::OpenModelGroup::wait_finished)
#[derive(Default)]
pub(crate) struct Finished {
    done: Mutex<bool>,
    condvar: Condvar,
}

impl Finished {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark(&self) {
        if let Ok(mut done) = self.done.lock() {
            *done = true;
            self.condvar.notify_all();
        }
    }

    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        let Ok(mut done) = self.done.lock() else {
            return false;
        };
        while !*done {
            let remaining = match deadline.checked_duration_since(std::time::Instant::now()) {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => return false,
            };
            match self.condvar.wait_timeout(done, remaining) {
                Ok((guard, _)) => done = guard,
                Err(_) => return false,
            }
        }
        true
    }
}

pub(crate) struct WorkerStarter {
    pub(crate) generator: ScheduleProcessGenerator,
    pub(crate) executor: Arc<BoundedExecutor>,
    pub(crate) active: Arc<ActiveSet>,
    pub(crate) finished: Arc<Finished>,
    pub(crate) factory: WorkerFactory,
}

impl WorkerStarter {
    pub(crate) async fn run(mut self) {
        let start_instant = Instant::now();
        let start_ns = timing::time_ns();
        let total_duration = self.generator.total_duration();
        let end_ns = start_ns + timing::offset_ns(total_duration);
        tracing::info!(total_duration_s = total_duration, "launch driver started");

        let mut index = 0usize;
        while let Some(offset) = self.generator.next() {
            let target = start_instant + Duration::from_secs_f64(offset);
            if target > Instant::now() {
                tokio::time::sleep_until(target).await;
            }
            // Past-due launches proceed immediately; the anchor to the start
            // instant means one late event never delays the rest

            let worker = (self.factory)(index);
            let cancel = CancelToken::new();
            let ctx = WorkerContext::new(index, end_ns, cancel.clone());
            self.active.insert(
                index,
                ActiveWorker { name: worker.name().to_string(), cancel, join: None },
            );

            let active = self.active.clone();
            let spawned = self.executor.spawn(async move {
                worker.run(ctx).await;
                active.remove(index);
            });
            match spawned {
                Some(join) => self.active.attach_join(index, join),
                None => {
                    tracing::warn!(index, "worker pool already shut down, stopping launches");
                    self.active.remove(index);
                    break;
                }
            }
            index += 1;
        }

        // A schedule ending in a pause still owns the clock until end_ns
        match timing::ns_until(end_ns) {
            Some(left) => {
                tracing::info!(
                    wait_s = left.as_secs_f64(),
                    "no more arrivals, waiting for the end of the schedule"
                );
                tokio::time::sleep(left).await;
            }
            None => {
                let overrun_ms = (timing::time_ns().saturating_sub(end_ns)) / 1_000_000;
                tracing::info!(overrun_ms, "schedule finished late");
            }
        }

        let stragglers = self.active.len();
        if stragglers == 0 {
            tracing::info!(launched = index, "schedule complete, all workers finished");
        } else {
            tracing::info!(
                stragglers,
                "schedule complete with workers still running; interrupting them. \
                 End the schedule with pause(...) to give workers time to finish"
            );
            self.active.interrupt_all();
        }
        self.executor.shutdown();
        self.finished.mark();
        tracing::info!(launched = index, "launch driver done");
    }
}
