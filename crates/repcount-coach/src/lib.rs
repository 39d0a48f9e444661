//! Repcount coach: periodic form advice from a remote service, kept off the
//! frame loop.
//!
//! The frame loop calls [`Coach::offer`] every frame. At most one snapshot
//! per interval is queued to a single worker thread; slow or failing
//! services never delay counting, and a full queue simply drops the
//! snapshot.

pub mod coach;
pub mod mock;
pub mod scheduler;
pub mod service;
pub mod worker;

// ============================================================================
// CURATED PUBLIC API EXPORTS
// ============================================================================

pub use coach::{Coach, Offer};
pub use mock::{MockCoach, RecordingAnnouncer};
pub use scheduler::CoachScheduler;
pub use service::{Announcer, CoachError, CoachRequest, CoachingService, LogAnnouncer};
pub use worker::{
    CoachWorker, MetricsSnapshot, ShutdownOutcome, SubmitError, WorkerCmd, WorkerMetrics,
};
