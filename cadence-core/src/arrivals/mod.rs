//! Arrival-process generation
//!
//! Ramp generators turn a `(begin_rate, end_rate, duration)` envelope into a
//! finite, ordered sequence of event instants inside `[0, duration]`. The
//! process generator stitches per-step ramps together into one global
//! timestamp stream for a whole [`ThreadSchedule`](crate::schedule::ThreadSchedule).

pub mod even;
pub mod poisson;
pub mod process;

pub use even::EvenArrivalsRamp;
pub use poisson::PoissonArrivalsRamp;
pub use process::ScheduleProcessGenerator;

/// A reusable generator of event instants for one linear rate ramp
///
/// A prepared generator is a single forward pass: it is drained once through
/// its `Iterator` impl and is not restartable without calling `prepare`
/// again. `prepare` clears all prior state, so one instance can serve many
/// schedule steps in turn.
pub trait ArrivalsRamp: Iterator<Item = f64> {
    /// Arm the generator for a ramp from `begin_rate` to `end_rate` events
    /// per second over `duration` seconds.
    ///
    /// Negative rates or durations are a caller contract violation.
    fn prepare(&mut self, begin_rate: f64, end_rate: f64, duration: f64);

    /// Generator name for logging
    fn name(&self) -> &'static str;
}
