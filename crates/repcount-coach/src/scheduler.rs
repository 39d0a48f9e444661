use std::time::{Duration, Instant};

/// Decides on the frame loop when the next coaching snapshot is due.
/// Pure bookkeeping; never blocks.
#[derive(Debug, Clone)]
pub struct CoachScheduler {
    interval: Duration,
    last: Option<Instant>,
}

impl CoachScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// The first call is always due
    pub fn due(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Record an offer at `now`, whether or not the worker accepted it
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// `due` and `mark` in one step
    pub fn claim(&mut self, now: Instant) -> bool {
        if self.due(now) {
            self.mark(now);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
