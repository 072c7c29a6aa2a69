//! Cadence Core Library
//!
//! Open-model load scheduling: a small schedule expression language, arrival
//! process generation (even and Poisson ramps), and a launch scheduler that
//! starts opaque workers at their scheduled instants over a bounded
//! execution pool. The library is consumed in-process by a larger load
//! harness; it knows nothing about what a worker actually does.
//!
//! ```
//! use cadence_core::ThreadSchedule;
//!
//! let schedule = ThreadSchedule::parse("rate(2/sec) random_arrivals(3 min) pause(1 min)")?;
//! assert_eq!(schedule.total_duration(), 240.0);
//! # Ok::<(), cadence_core::Error>(())
//! ```

pub mod arrivals;
pub mod config;
pub mod error;
pub mod group;
pub mod schedule;
pub mod seed;
pub mod timing;

pub use arrivals::{ArrivalsRamp, EvenArrivalsRamp, PoissonArrivalsRamp, ScheduleProcessGenerator};
pub use config::OpenModelConfig;
pub use error::{Error, Result};
pub use group::{
    BoundedExecutor, CancelToken, OpenModelGroup, Worker, WorkerContext, MAX_POOL_THREADS,
};
pub use schedule::{ArrivalsKind, ScheduleStep, ThreadSchedule};
