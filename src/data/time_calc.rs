//! File/code adapted from https://github.com/jamjamjon/usls

use std::time::Duration;

/// Accumulated per-step timings (preprocess, inference, postprocess) across calls.
#[derive(Debug, Default)]
pub struct TimeCalc {
    calls: usize,
    duration: Vec<Duration>,
}

impl TimeCalc {
    pub fn total(&self) -> Duration {
        self.duration.iter().sum::<Duration>()
    }

    pub fn avg(&self) -> Duration {
        match self.calls {
            0 => Duration::ZERO,
            n => self.total() / n as u32,
        }
    }

    pub fn add_or_push(&mut self, i: usize, x: Duration) {
        match self.duration.get_mut(i) {
            Some(elem) => *elem += x,
            None => self.duration.push(x),
        }
    }

    /// Marks the end of one call.
    pub fn tick(&mut self) {
        self.calls += 1;
    }
}
