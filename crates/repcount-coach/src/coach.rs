use crate::scheduler::CoachScheduler;
use crate::service::{Announcer, CoachRequest, CoachingService};
use crate::worker::{CoachWorker, MetricsSnapshot, ShutdownOutcome, SubmitError};
use repcount_core::{CoachConfig, LandmarkFrame, SessionState};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What happened to a frame offered to the coach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Interval has not elapsed yet
    NotDue,
    Queued,
    /// Worker busy and queue full
    Dropped,
    Stopped,
}

/// Frame-loop side of periodic coaching: rate limiting plus a worker.
///
/// `offer` is cheap and never blocks, so it can be called on every frame.
pub struct Coach {
    scheduler: CoachScheduler,
    worker: CoachWorker,
    sequence: u64,
}

impl Coach {
    pub fn start(
        service: Arc<dyn CoachingService>,
        announcer: Arc<dyn Announcer>,
        config: &CoachConfig,
    ) -> Self {
        log::info!(
            "coach {} started (every {}s, queue {})",
            service.name(),
            config.interval_secs,
            config.queue_capacity
        );
        Self {
            scheduler: CoachScheduler::new(Duration::from_secs(config.interval_secs)),
            worker: CoachWorker::start(service, announcer, config),
            sequence: 0,
        }
    }

    /// `None` when coaching is disabled in configuration
    pub fn from_config(
        service: Arc<dyn CoachingService>,
        announcer: Arc<dyn Announcer>,
        config: &CoachConfig,
    ) -> Option<Self> {
        config
            .enabled
            .then(|| Self::start(service, announcer, config))
    }

    /// Offer the current frame and state. Only snapshots taken once the
    /// interval has elapsed reach the worker.
    pub fn offer(&mut self, now: Instant, frame: &LandmarkFrame, state: &SessionState) -> Offer {
        if !self.scheduler.claim(now) {
            return Offer::NotDue;
        }

        self.sequence += 1;
        let request = CoachRequest {
            sequence: self.sequence,
            exercise: state.exercise,
            frame: frame.clone(),
            state: state.clone(),
        };

        match self.worker.submit(request) {
            Ok(()) => Offer::Queued,
            Err(SubmitError::QueueFull) => Offer::Dropped,
            Err(SubmitError::Stopped) => Offer::Stopped,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.worker.metrics()
    }

    pub fn shutdown(self) -> ShutdownOutcome {
        self.worker.shutdown()
    }
}
