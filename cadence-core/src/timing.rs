//! Nanosecond-precision monotonic clock
//!
//! All scheduling offsets and worker deadlines are expressed on a single
//! monotonic timeline anchored at the first call to [`time_ns`].

use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Global anchor for monotonic nanosecond timestamps
static START: OnceLock<Instant> = OnceLock::new();

/// Get current time in nanoseconds since the process anchor
///
/// Monotonic, so safe to use for deadlines even when the wall clock moves.
#[inline]
pub fn time_ns() -> u64 {
    let start = START.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

/// Convert a schedule offset in seconds to nanoseconds, rounding half-up
#[inline]
pub fn offset_ns(seconds: f64) -> u64 {
    (seconds * 1e9).round() as u64
}

/// Remaining duration until `target_ns`, or `None` if the target is past due
///
/// A past-due target never yields a negative sleep; callers proceed
/// immediately and the schedule self-corrects instead of bursting.
#[inline]
pub fn ns_until(target_ns: u64) -> Option<Duration> {
    let now = time_ns();
    if target_ns > now {
        Some(Duration::from_nanos(target_ns - now))
    } else {
        None
    }
}
