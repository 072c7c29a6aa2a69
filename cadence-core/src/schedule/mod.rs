//! Schedule expression language
//!
//! A schedule expression turns a declarative description such as
//! `"rate(2/sec) random_arrivals(3 min) rate(10/sec) pause(1 min)"` into an
//! ordered list of typed steps. Rate steps set the instantaneous target
//! arrival rate in events per second; arrivals steps open a window during
//! which arrivals occur, ramping linearly from the rate in effect at the
//! window start to the next declared rate.

pub mod parser;
pub mod tokenizer;

pub use tokenizer::{tokenize, PosToken, Token};

use crate::Result;
use std::fmt;

/// How arrivals are spaced inside an arrivals window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalsKind {
    /// Deterministic spacing solving the integrated rate function
    Even,
    /// Poisson process honoring the same rate envelope
    Random,
}

/// One step of a parsed schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduleStep {
    /// Instantaneous target arrival rate in events per second
    Rate { rate: f64 },
    /// A window of `duration` seconds during which arrivals occur
    Arrivals { kind: ArrivalsKind, duration: f64 },
}

impl fmt::Display for ScheduleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleStep::Rate { rate } => write!(f, "Rate({rate})"),
            ScheduleStep::Arrivals { kind: ArrivalsKind::Even, duration } => {
                write!(f, "EvenArrivals({duration})")
            }
            ScheduleStep::Arrivals { kind: ArrivalsKind::Random, duration } => {
                write!(f, "RandomArrivals({duration})")
            }
        }
    }
}

/// A parsed, immutable schedule: ordered steps plus the derived total duration
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadSchedule {
    steps: Vec<ScheduleStep>,
    total_duration: f64,
}

impl ThreadSchedule {
    /// Parse a schedule expression
    ///
    /// Fails fast with a positioned [`Error`](crate::Error) on malformed
    /// input; nothing is launched from a schedule that does not parse.
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse(text)
    }

    pub(crate) fn from_steps(steps: Vec<ScheduleStep>) -> Self {
        let total_duration = steps
            .iter()
            .map(|step| match step {
                ScheduleStep::Arrivals { duration, .. } => *duration,
                ScheduleStep::Rate { .. } => 0.0,
            })
            .sum();
        Self { steps, total_duration }
    }

    /// The parsed steps, in order
    pub fn steps(&self) -> &[ScheduleStep] {
        &self.steps
    }

    /// Sum of all arrivals-window durations, in seconds
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }
}

impl fmt::Display for ThreadSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{step}")?;
        }
        write!(f, "]")
    }
}
