//! Poisson arrivals honoring a linear rate envelope
//!
//! The target count for the window is split into a constant baseline at the
//! lower of the two rates, drawn uniformly over the window, plus a ramp
//! remainder drawn by inverse-transform sampling of a linearly rising or
//! falling arrival density. Sorting the union yields one ordered sequence
//! matching the envelope; every event lands in the half-open window
//! `[0, duration)`.

use super::ArrivalsRamp;
use crate::seed::rng_from_seed;
use rand::rngs::SmallRng;
use rand::Rng;

/// Inverse CDF of a density rising linearly from zero over the window.
/// Maps `u` in `[0, 1)` to an offset in `[0, duration)`.
fn rising_offset(u: f64, duration: f64) -> f64 {
    u.sqrt() * duration
}

/// Inverse CDF of a density falling linearly to zero over the window.
///
/// Inverts the falling CDF directly instead of mirroring [`rising_offset`]:
/// the mirror `(1 - sqrt(u)) * duration` sends `u == 0` to `duration`
/// itself, outside the half-open window.
fn falling_offset(u: f64, duration: f64) -> f64 {
    (1.0 - (1.0 - u).sqrt()) * duration
}

/// Randomly spaced arrival instants for a (possibly zero-slope) linear ramp
///
/// Owns its RNG; the produced sequence is fully determined by the prepared
/// envelope and the RNG state, so a seeded instance replays identically.
pub struct PoissonArrivalsRamp {
    rng: SmallRng,
    events: Vec<f64>,
    cursor: usize,
}

impl PoissonArrivalsRamp {
    /// Create a ramp drawing fresh entropy
    pub fn new() -> Self {
        Self::with_seed(None)
    }

    /// Create a ramp with an explicit seed (`None` = fresh entropy)
    pub fn with_seed(seed: Option<u64>) -> Self {
        Self {
            rng: rng_from_seed(seed),
            events: Vec::new(),
            cursor: 0,
        }
    }

    /// Number of events the current preparation will produce in total
    pub fn num_events(&self) -> u64 {
        self.events.len() as u64
    }
}

impl Default for PoissonArrivalsRamp {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrivalsRamp for PoissonArrivalsRamp {
    fn prepare(&mut self, begin_rate: f64, end_rate: f64, duration: f64) {
        debug_assert!(begin_rate >= 0.0 && end_rate >= 0.0 && duration >= 0.0);
        self.events.clear();
        self.cursor = 0;

        let num_events = ((begin_rate + end_rate) / 2.0 * duration).floor() as u64;
        let min_rate = begin_rate.min(end_rate);
        let flat_events = (min_rate * duration).floor() as u64;

        // Constant baseline at the lower rate: uniform over the window
        for _ in 0..flat_events {
            self.events.push(self.rng.random::<f64>() * duration);
        }

        // Ramp remainder: density rises linearly from zero, or falls to it
        if begin_rate != end_rate {
            for _ in flat_events..num_events {
                let u = self.rng.random::<f64>();
                let t = if end_rate > begin_rate {
                    rising_offset(u, duration)
                } else {
                    falling_offset(u, duration)
                };
                self.events.push(t);
            }
        }

        self.events.sort_by(f64::total_cmp);
    }

    fn name(&self) -> &'static str {
        "RandomArrivals"
    }
}

impl Iterator for PoissonArrivalsRamp {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let event = self.events.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(event)
    }
}
