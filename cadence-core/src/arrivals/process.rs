//! Global timestamp stream for a whole schedule
//!
//! Walks the step list while tracking the cumulative time offset and the
//! rate in effect, delegating each arrivals window to the matching ramp
//! generator and offsetting its events into schedule time.

use super::{ArrivalsRamp, EvenArrivalsRamp, PoissonArrivalsRamp};
use crate::schedule::{ArrivalsKind, ScheduleStep, ThreadSchedule};

/// Lazy, finite, monotonically non-decreasing stream of absolute schedule
/// offsets (seconds from schedule start)
///
/// Single pass: drain it once through the `Iterator` impl. Build a new
/// generator to replay a schedule.
pub struct ScheduleProcessGenerator {
    steps: Vec<ScheduleStep>,
    total_duration: f64,
    step_index: usize,
    time_offset: f64,
    begin_rate: f64,
    even: EvenArrivalsRamp,
    poisson: PoissonArrivalsRamp,
    /// Window currently being drained, with its start offset
    current: Option<(ArrivalsKind, f64)>,
}

impl ScheduleProcessGenerator {
    /// Build a generator for the schedule (`seed` `None` = fresh entropy)
    pub fn new(schedule: &ThreadSchedule, seed: Option<u64>) -> Self {
        Self {
            steps: schedule.steps().to_vec(),
            total_duration: schedule.total_duration(),
            step_index: 0,
            time_offset: 0.0,
            begin_rate: 0.0,
            even: EvenArrivalsRamp::new(),
            poisson: PoissonArrivalsRamp::with_seed(seed),
            current: None,
        }
    }

    /// Sum of all arrivals-window durations, in seconds
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Prepare the next arrivals window, skipping rate steps along the way.
    /// Returns `false` once no arrivals step remains.
    fn open_next_window(&mut self) -> bool {
        while self.step_index < self.steps.len() {
            match self.steps[self.step_index] {
                ScheduleStep::Rate { rate } => {
                    self.begin_rate = rate;
                    self.step_index += 1;
                }
                ScheduleStep::Arrivals { kind, duration } => {
                    // The window ramps toward an immediately following rate
                    // step; otherwise the rate holds flat
                    let end_rate = match self.steps.get(self.step_index + 1) {
                        Some(ScheduleStep::Rate { rate }) => *rate,
                        _ => self.begin_rate,
                    };
                    let window_start = self.time_offset;
                    self.time_offset += duration;
                    self.step_index += 1;
                    let generator = match kind {
                        ArrivalsKind::Even => {
                            self.even.prepare(self.begin_rate, end_rate, duration);
                            self.even.name()
                        }
                        ArrivalsKind::Random => {
                            self.poisson.prepare(self.begin_rate, end_rate, duration);
                            self.poisson.name()
                        }
                    };
                    tracing::debug!(
                        generator,
                        window_start,
                        duration,
                        begin_rate = self.begin_rate,
                        end_rate,
                        "opening arrivals window"
                    );
                    self.current = Some((kind, window_start));
                    return true;
                }
            }
        }
        false
    }
}

impl Iterator for ScheduleProcessGenerator {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        loop {
            if let Some((kind, window_start)) = self.current {
                let event = match kind {
                    ArrivalsKind::Even => self.even.next(),
                    ArrivalsKind::Random => self.poisson.next(),
                };
                if let Some(t) = event {
                    return Some(window_start + t);
                }
                // Empty or drained window: move on without ending the stream
                self.current = None;
            }
            if !self.open_next_window() {
                return None;
            }
        }
    }
}
