//! Test doubles for the coaching collaborators.
//!
//! These return deterministic responses so the worker can be exercised
//! without network or audio.

use crate::service::{Announcer, CoachError, CoachRequest, CoachingService};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::time::Duration;

/// Mock coaching service.
///
/// Supports:
/// - Canned responses per exercise id
/// - Simulated errors
/// - Artificial latency
#[derive(Debug)]
pub struct MockCoach {
    /// Canned responses: exercise id -> advice
    responses: RwLock<HashMap<String, String>>,

    /// Response when no canned entry matches
    default_response: String,

    /// Sleep before answering
    latency: Duration,

    simulate_error: RwLock<Option<CoachError>>,

    call_count: Mutex<usize>,
}

impl Default for MockCoach {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCoach {
    pub fn new() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            default_response: "Keep going, nice form".to_string(),
            latency: Duration::ZERO,
            simulate_error: RwLock::new(None),
            call_count: Mutex::new(0),
        }
    }

    pub fn with_default_response(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            ..Self::new()
        }
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::new()
        }
    }

    pub fn add_response(&self, exercise_id: impl Into<String>, response: impl Into<String>) {
        self.responses
            .write()
            .insert(exercise_id.into(), response.into());
    }

    /// Fail every call until cleared
    pub fn simulate_error(&self, error: CoachError) {
        *self.simulate_error.write() = Some(error);
    }

    pub fn clear_error(&self) {
        *self.simulate_error.write() = None;
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

impl CoachingService for MockCoach {
    fn analyze(&self, request: &CoachRequest) -> Result<String, CoachError> {
        *self.call_count.lock() += 1;

        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if let Some(err) = self.simulate_error.read().clone() {
            return Err(err);
        }

        let responses = self.responses.read();
        Ok(responses
            .get(request.exercise.id())
            .cloned()
            .unwrap_or_else(|| self.default_response.clone()))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Announcer that keeps every line it was given
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    lines: Mutex<Vec<String>>,
}

impl RecordingAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }
}
