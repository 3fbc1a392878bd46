//! Cyclic scheduling horizon.
//!
//! Hours are indexed `0..T`. The day repeats, so the hour before `0` is
//! `T - 1`; there is no free initial condition anywhere in the model.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A fixed-length, wrap-around sequence of hourly time steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Horizon {
    hours: usize,
}

impl Horizon {
    pub fn new(hours: usize) -> Self {
        Self { hours }
    }

    /// One operating day of hourly steps.
    pub fn day() -> Self {
        Self::new(24)
    }

    #[inline]
    pub fn hours(&self) -> usize {
        self.hours
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hours == 0
    }

    /// Index of the step preceding `t`, wrapping `0` to `T - 1`.
    ///
    /// Panics if the horizon is empty; callers validate `T > 0` first.
    #[inline]
    pub fn prev(&self, t: usize) -> usize {
        (t + self.hours - 1) % self.hours
    }

    pub fn iter(&self) -> Range<usize> {
        0..self.hours
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self::day()
    }
}
