//! Open-model thread group
//!
//! An [`OpenModelGroup`] turns a parsed schedule into launched workers: a
//! launch driver on the process-wide housekeeping runtime walks the arrival
//! timestamp stream and submits one worker per event to a bounded pool.
//! Workers are created on demand at their scheduled instant; their number is
//! not limited by the pool size.

pub mod executor;
pub mod starter;
pub mod worker;

pub use executor::{BoundedExecutor, MAX_POOL_THREADS};
pub use starter::WorkerFactory;
pub use worker::{CancelToken, Worker, WorkerContext};

use crate::arrivals::ScheduleProcessGenerator;
use crate::config::OpenModelConfig;
use crate::schedule::ThreadSchedule;
use crate::{seed, Result};
use starter::{ActiveSet, Finished, WorkerStarter};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

/// Process-wide housekeeping runtime for launch drivers
///
/// Created once at first use and reused by every group across schedule
/// restarts; never torn down mid-process. Driving launches here keeps
/// scheduling precision independent of worker-pool saturation.
static HOUSEKEEPING: OnceLock<Runtime> = OnceLock::new();

fn housekeeping() -> &'static Runtime {
    HOUSEKEEPING.get_or_init(|| {
        Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("cadence-housekeeping")
            .enable_all()
            .build()
            .expect("failed to build housekeeping runtime")
    })
}

/// The thread group that emulates an open load model
///
/// Arrivals are generated by the configured schedule independently of how
/// long individual workers take, in contrast to closed fixed-thread-count
/// models. All lifecycle operations are idempotent.
pub struct OpenModelGroup {
    config: OpenModelConfig,
    active: Arc<ActiveSet>,
    finished: Arc<Finished>,
    executor: Mutex<Option<Arc<BoundedExecutor>>>,
    starter: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for OpenModelGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenModelGroup")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenModelGroup {
    /// Create a group, validating the configuration eagerly
    pub fn new(config: OpenModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            active: Arc::new(ActiveSet::new()),
            finished: Arc::new(Finished::new()),
            executor: Mutex::new(None),
            starter: Mutex::new(None),
        })
    }

    /// Start the schedule, launching workers from `factory` at their
    /// scheduled instants
    ///
    /// The factory is called synchronously on the launch driver with the
    /// zero-based worker index. Returns immediately; the schedule runs in
    /// the background until completion, [`stop`](Self::stop) or
    /// [`interrupt_all`](Self::interrupt_all).
    pub fn start<F>(&self, factory: F) -> Result<()>
    where
        F: FnMut(usize) -> Arc<dyn Worker> + Send + 'static,
    {
        let schedule = ThreadSchedule::parse(&self.config.schedule)?;
        tracing::info!(
            schedule = %schedule,
            total_duration_s = schedule.total_duration(),
            seed = self.config.random_seed,
            "starting open-model group"
        );

        let derived = self
            .config
            .seed()
            .map(|master| seed::derive_seed(master, seed::components::ARRIVAL_PROCESS));
        let generator = ScheduleProcessGenerator::new(&schedule, derived);

        let pool = Arc::new(BoundedExecutor::new(self.config.max_pool_threads)?);
        if let Ok(mut slot) = self.executor.lock() {
            *slot = Some(pool.clone());
        }

        let driver = WorkerStarter {
            generator,
            executor: pool,
            active: self.active.clone(),
            finished: self.finished.clone(),
            factory: Box::new(factory),
        };
        let handle = housekeeping().spawn(driver.run());
        if let Ok(mut slot) = self.starter.lock() {
            *slot = Some(handle);
        }
        Ok(())
    }

    /// Number of workers currently believed to be running
    pub fn active_workers(&self) -> usize {
        self.active.len()
    }

    /// Graceful stop: cancel the launch driver and ask every active worker
    /// to stop at its next checkpoint. In-flight operations keep running.
    /// Idempotent.
    pub fn stop(&self) {
        tracing::info!("gracefully stopping the group");
        if let Some(handle) = self.starter.lock().ok().and_then(|mut slot| slot.take()) {
            handle.abort();
        }
        self.active.stop_all();
        self.finished.mark();
    }

    /// Forced stop: graceful stop, then interrupt in-flight operations,
    /// cancel worker futures and shut the pool down. Idempotent.
    pub fn interrupt_all(&self) {
        self.stop();
        tracing::info!("interrupting the workers");
        self.active.interrupt_all();
        if let Some(pool) = self.executor.lock().ok().and_then(|mut slot| slot.take()) {
            pool.shutdown();
        }
    }

    /// Block until the schedule has finished (or was stopped), with a bound
    ///
    /// Returns `false` on timeout.
    pub fn wait_finished(&self, timeout: Duration) -> bool {
        self.finished.wait(timeout)
    }

    /// Idempotent close; equivalent to [`interrupt_all`](Self::interrupt_all)
    pub fn close(&self) {
        self.interrupt_all();
    }
}

impl Drop for OpenModelGroup {
    fn drop(&mut self) {
        self.close();
    }
}
