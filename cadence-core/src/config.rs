//! Configuration for open-model thread groups

use crate::schedule::ThreadSchedule;
use crate::Result;
use serde::{Deserialize, Serialize};

fn default_max_pool_threads() -> usize {
    crate::group::MAX_POOL_THREADS
}

/// Configuration for an [`OpenModelGroup`](crate::group::OpenModelGroup)
///
/// The schedule expression is the sole required input; everything else has
/// workable defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenModelConfig {
    /// Schedule expression, e.g. `"rate(50/sec) random_arrivals(2 min) pause(10 s)"`
    pub schedule: String,
    /// Master seed for reproducible schedules. `0` means a fresh seed per run.
    #[serde(default)]
    pub random_seed: u64,
    /// Cap on real pool threads for worker execution
    #[serde(default = "default_max_pool_threads")]
    pub max_pool_threads: usize,
}

impl OpenModelConfig {
    /// Create a config with the given schedule expression and defaults elsewhere
    pub fn new(schedule: impl Into<String>) -> Self {
        Self {
            schedule: schedule.into(),
            random_seed: 0,
            max_pool_threads: default_max_pool_threads(),
        }
    }

    /// Set the master seed (`0` = fresh seed per run)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Effective seed: `None` when the configured seed is `0`
    pub fn seed(&self) -> Option<u64> {
        if self.random_seed == 0 {
            None
        } else {
            Some(self.random_seed)
        }
    }

    /// Validate the configuration, parsing the schedule eagerly
    ///
    /// Malformed schedules fail here, at configuration time, before any
    /// worker is launched.
    pub fn validate(&self) -> Result<ThreadSchedule> {
        if self.max_pool_threads == 0 {
            return Err(crate::Error::Config(
                "max_pool_threads must be at least 1".to_string(),
            ));
        }
        ThreadSchedule::parse(&self.schedule)
    }
}
