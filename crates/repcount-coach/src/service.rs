//! Collaborator interfaces for remote coaching and speech output.

use repcount_core::{ExerciseKind, LandmarkFrame, SessionState};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Errors a coaching backend can report. Never seen by the frame loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoachError {
    /// Service is not reachable or not configured
    #[error("coach not available: {0}")]
    NotAvailable(String),

    #[error("coach timeout after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("invalid coach response: {0}")]
    InvalidResponse(String),

    #[error("coach backend error: {0}")]
    Backend(String),
}

// ============================================================================
// REQUEST
// ============================================================================

/// Snapshot handed to the coaching service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachRequest {
    /// Monotonic per-coach sequence number
    pub sequence: u64,
    pub exercise: ExerciseKind,
    pub frame: LandmarkFrame,
    pub state: SessionState,
}

// ============================================================================
// TRAITS
// ============================================================================

/// Remote analysis of a frame snapshot, returning free-form advice.
///
/// Calls are blocking and may take seconds; they only ever run on the
/// coaching worker thread.
pub trait CoachingService: Send + Sync + Debug {
    fn analyze(&self, request: &CoachRequest) -> Result<String, CoachError>;

    /// Name for diagnostics
    fn name(&self) -> &'static str;
}

/// Speaks or otherwise presents coaching text
pub trait Announcer: Send + Sync + Debug {
    fn announce(&self, text: &str);
}

/// Announcer that writes advice to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, text: &str) {
        log::info!("coach: {}", text);
    }
}
