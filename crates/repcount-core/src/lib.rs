//! Repcount core: landmark-driven exercise phase classification and
//! repetition counting.
//!
//! Each frame flows metric -> baseline -> hysteresis phase -> phase history
//! -> rep matcher -> status text, all owned by one [`ExerciseSession`].
//! Pure computation: no threads, no I/O outside explicit config loading.

#![allow(clippy::new_without_default)]

pub mod calibration;
pub mod classifier;
pub mod config;
pub mod exercise;
pub mod feedback;
pub mod history;
pub mod landmarks;
pub mod matcher;
pub mod metrics;
pub mod phase;
pub mod session;

#[cfg(test)]
pub mod tests_config;
#[cfg(test)]
pub mod tests_proptest;

// ============================================================================
// CURATED PUBLIC API EXPORTS
// ============================================================================

// Landmarks and metrics
pub use landmarks::{Joint, Landmark, LandmarkFrame};
pub use metrics::{
    LandmarkFault, MetricError, MetricFormula, MetricSample, SampleValue, Side, SideSelection,
    CONFIDENCE_FLOOR, MIN_NORMALIZER,
};

// Pipeline stages
pub use calibration::{Baseline, CalibrationIncomplete, CalibrationProgress, Calibrator};
pub use classifier::PhaseClassifier;
pub use history::PhaseHistory;
pub use matcher::{RepCounter, RepEvent, RepPatternMatcher};
pub use phase::{Direction, Phase, PhaseBand};

// Exercises and configuration
pub use config::{CoachConfig, ConfigError, ExerciseOverride, RepcountConfig, SessionConfig};
pub use exercise::{
    CountingRule, ExerciseConfig, ExerciseKind, HoldGauge, PhaseCue, RepGate, Tracking,
};

// Session
pub use session::{
    ExerciseSession, GaugePeak, RepCounts, SessionError, SessionState, SessionStatus,
    SessionSummary, SidePhases,
};
