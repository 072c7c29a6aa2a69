//! Evenly spaced arrivals for a linear rate ramp
//!
//! Integrating a linearly changing rate `r(t) = begin + a·t` gives the
//! cumulative arrival count `N(t) = begin·t + a·t²/2`. Inverting `N(t) = n`
//! places event `n` at the instant where exactly `n` arrivals have
//! accumulated, which spaces events evenly in arrival-count terms rather
//! than in wall time.

use super::ArrivalsRamp;

/// Relative rate difference below which a ramp is treated as constant
const FLAT_RAMP_EPSILON: f64 = 0.0001;

/// Deterministic arrival instants for a (possibly zero-slope) linear ramp
#[derive(Debug, Default)]
pub struct EvenArrivalsRamp {
    begin_rate: f64,
    mean_rate: f64,
    acceleration: f64,
    num_events: u64,
    next_event: u64,
}

impl EvenArrivalsRamp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events the current preparation will produce in total
    pub fn num_events(&self) -> u64 {
        self.num_events
    }
}

impl ArrivalsRamp for EvenArrivalsRamp {
    fn prepare(&mut self, begin_rate: f64, end_rate: f64, duration: f64) {
        debug_assert!(begin_rate >= 0.0 && end_rate >= 0.0 && duration >= 0.0);
        let mean_rate = (begin_rate + end_rate) / 2.0;
        self.begin_rate = begin_rate;
        self.mean_rate = mean_rate;
        self.num_events = (mean_rate * duration).floor() as u64;
        self.acceleration = if (end_rate - begin_rate).abs() < FLAT_RAMP_EPSILON * mean_rate
            || duration == 0.0
        {
            0.0
        } else {
            (end_rate - begin_rate) / duration
        };
        self.next_event = 0;
    }

    fn name(&self) -> &'static str {
        "EvenArrivals"
    }
}

impl Iterator for EvenArrivalsRamp {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next_event >= self.num_events {
            return None;
        }
        let n = self.next_event as f64;
        self.next_event += 1;
        if n == 0.0 {
            return Some(0.0);
        }
        let t = if self.acceleration == 0.0 {
            n / self.mean_rate
        } else {
            // Invert N(t) = begin·t + a·t²/2 for t, taking the positive root
            ((self.begin_rate * self.begin_rate + 2.0 * self.acceleration * n).sqrt()
                - self.begin_rate)
                / self.acceleration
        };
        Some(t)
    }
}
