//! Per-exercise session state machine.
//!
//! `Uncalibrated -> Calibrating -> Tracking`. One [`ExerciseSession::advance`]
//! call per captured frame; it never blocks and never fails for a bad frame.

use crate::calibration::{Baseline, CalibrationProgress, Calibrator};
use crate::classifier::PhaseClassifier;
use crate::config::{ConfigError, SessionConfig};
use crate::exercise::{CountingRule, ExerciseConfig, ExerciseKind, Tracking};
use crate::feedback::{self, FeedbackInput};
use crate::history::PhaseHistory;
use crate::landmarks::LandmarkFrame;
use crate::matcher::{RepCounter, RepEvent, RepPatternMatcher};
use crate::metrics::{SampleValue, Side, SideSelection};
use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{exercise} tracks both sides together; side selection is unsupported")]
    SideSelectUnsupported { exercise: ExerciseKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Uncalibrated,
    Calibrating,
    Tracking,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepCounts {
    pub total: u32,
    /// Per-side counts; zero for exercises tracked as one lane
    pub left: u32,
    pub right: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePhases {
    pub left: Option<Phase>,
    pub right: Option<Phase>,
}

/// Snapshot returned by every `advance` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub exercise: ExerciseKind,
    pub status: SessionStatus,
    pub phase: Option<Phase>,
    /// Per-side phases for exercises tracked per side
    pub side_phases: Option<SidePhases>,
    pub reps: RepCounts,
    pub feedback: String,
    pub calibration: CalibrationProgress,
    pub hold_percent: Option<f32>,
    /// A rep was counted on this frame
    pub rep_completed: bool,
    /// The required landmarks were usable on this frame
    pub detected: bool,
    /// A normalizing distance was clamped on this frame
    pub degenerate: bool,
}

/// Highest reading of one hold gauge since the last reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugePeak {
    pub phase: Phase,
    pub label: String,
    pub percent: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub exercise: ExerciseKind,
    pub reps: RepCounts,
    pub frames_processed: u64,
    /// Frames dropped for missing or low-confidence landmarks
    pub frames_skipped: u64,
    /// One entry per gauge of the exercise, in configuration order
    pub gauge_peaks: Vec<GaugePeak>,
}

/// Classification and counting state for one tracked side (or for the whole
/// body when the exercise is tracked as one lane)
#[derive(Debug, Clone)]
struct Lane {
    side: Option<Side>,
    classifier: PhaseClassifier,
    history: PhaseHistory,
    matcher: RepPatternMatcher,
    counter: RepCounter,
    /// Highest gauge reading since the last matched cycle
    peak_percent: f32,
}

struct LaneStep {
    phase: Phase,
    hold: Option<f32>,
    event: Option<RepEvent>,
}

impl Lane {
    fn new(config: &ExerciseConfig, side: Option<Side>, collapse_repeats: bool) -> Self {
        let matcher = match &config.counting {
            CountingRule::Sequence { target } => RepPatternMatcher::sequence(target.clone()),
            CountingRule::BothSides { left, right } => {
                RepPatternMatcher::both_sides(*left, *right, config.neutral)
            }
        };
        Self {
            side,
            classifier: PhaseClassifier::new(config.bands.clone(), config.neutral),
            history: PhaseHistory::new(config.history_capacity, collapse_repeats),
            matcher,
            counter: RepCounter::new(),
            peak_percent: 0.0,
        }
    }

    fn step(&mut self, config: &ExerciseConfig, relative: f32) -> LaneStep {
        let phase = self.classifier.classify(relative);

        let hold = config.gauge(phase).and_then(|g| {
            config
                .band(phase)
                .map(|b| feedback::hold_percent(b.deflection(relative), g.dead_zone, g.full_scale))
        });
        if let Some(percent) = hold {
            self.peak_percent = self.peak_percent.max(percent);
        }
        if !self.classifier.is_settled() {
            return LaneStep {
                phase,
                hold,
                event: None,
            };
        }

        self.history.push(phase);
        let accept = config
            .rep_gate
            .as_ref()
            .map_or(true, |gate| self.peak_percent > gate.min_percent);
        let event = self
            .matcher
            .observe(phase, &mut self.history, &mut self.counter, accept);
        if event.is_some() {
            self.peak_percent = 0.0;
        }

        LaneStep { phase, hold, event }
    }

    /// Forget in-progress movement, keep the count
    fn restart(&mut self) {
        self.classifier.reset();
        self.history.clear();
        self.matcher.reset();
        self.peak_percent = 0.0;
    }
}

#[derive(Debug, Clone)]
pub struct ExerciseSession {
    config: ExerciseConfig,
    confidence_floor: f32,
    selection: SideSelection,
    calibrator: Calibrator,
    status: SessionStatus,
    lanes: Vec<Lane>,
    state: SessionState,
    gauge_peaks: Vec<GaugePeak>,
    frames_processed: u64,
    frames_skipped: u64,
}

impl ExerciseSession {
    /// Validate `config` and build an uncalibrated session
    pub fn new(config: ExerciseConfig, settings: &SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if !(0.0..=1.0).contains(&settings.confidence_floor) {
            return Err(ConfigError::Validation(
                "session.confidence_floor must be in [0, 1]".to_string(),
            ));
        }

        let lanes = match config.tracking {
            Tracking::Combined => vec![Lane::new(&config, None, settings.collapse_repeats)],
            Tracking::PerSide => vec![
                Lane::new(&config, Some(Side::Left), settings.collapse_repeats),
                Lane::new(&config, Some(Side::Right), settings.collapse_repeats),
            ],
        };
        let calibrator = Calibrator::new(config.calibration_window, config.formula.is_per_side());
        let gauge_peaks = config
            .gauges
            .iter()
            .map(|g| GaugePeak {
                phase: g.phase,
                label: g.label.clone(),
                percent: 0.0,
            })
            .collect();

        let mut session = Self {
            state: SessionState {
                exercise: config.kind,
                status: SessionStatus::Uncalibrated,
                phase: None,
                side_phases: None,
                reps: RepCounts::default(),
                feedback: String::new(),
                calibration: calibrator.progress(),
                hold_percent: None,
                rep_completed: false,
                detected: false,
                degenerate: false,
            },
            config,
            confidence_floor: settings.confidence_floor,
            selection: SideSelection::Both,
            calibrator,
            status: SessionStatus::Uncalibrated,
            lanes,
            gauge_peaks,
            frames_processed: 0,
            frames_skipped: 0,
        };
        // Absolute-scale exercises have nothing to calibrate and can start now
        session.state.feedback =
            session.compose(session.calibrator.is_ready(), None, None, None);
        Ok(session)
    }

    /// Session over a built-in exercise with default settings
    pub fn builtin(kind: ExerciseKind) -> Result<Self, ConfigError> {
        Self::new(ExerciseConfig::builtin(kind), &SessionConfig::default())
    }

    /// Process one frame and return the updated snapshot
    pub fn advance(&mut self, frame: &LandmarkFrame) -> SessionState {
        self.frames_processed += 1;
        self.state.rep_completed = false;
        self.state.hold_percent = None;

        let sample = match self
            .config
            .formula
            .extract(frame, self.selection, self.confidence_floor)
        {
            Ok(sample) => sample,
            Err(err) => {
                self.frames_skipped += 1;
                log::debug!("{}: frame skipped: {}", self.config.kind, err);
                self.state.detected = false;
                self.state.degenerate = false;
                self.state.feedback = self.compose(false, None, None, None);
                return self.state.clone();
            }
        };
        self.state.detected = true;
        self.state.degenerate = sample.degenerate;

        let consumed = !self.calibrator.is_ready();
        if consumed {
            self.status = SessionStatus::Calibrating;
            self.calibrator.observe(&sample.value);
        }
        let just_ready = self.status != SessionStatus::Tracking && self.calibrator.is_ready();
        if just_ready {
            self.status = SessionStatus::Tracking;
            log::info!("{}: tracking started", self.config.kind);
        }

        let mut outcome = None;
        let mut hold = None;
        match self.calibrator.baseline() {
            Ok(baseline) if !consumed => {
                let (event, percent) = self.track(sample.value, baseline);
                outcome = event;
                hold = percent;
            }
            Ok(_) => {}
            Err(incomplete) => log::debug!("{}: {}", self.config.kind, incomplete),
        }

        self.state.status = self.status;
        self.state.calibration = self.calibrator.progress();
        self.state.hold_percent = hold.map(|(_, percent)| percent);
        self.state.feedback = self.compose(just_ready, outcome, hold, None);
        self.state.clone()
    }

    /// Classify and count. Returns the first rep event of the frame and the
    /// primary lane's gauge reading.
    fn track(
        &mut self,
        value: SampleValue,
        baseline: Baseline,
    ) -> (Option<(RepEvent, Option<Side>)>, Option<(Phase, f32)>) {
        let (left, right) = relative(value, baseline);
        let combined = match (left, right) {
            (Some(l), Some(r)) => Some((l + r) / 2.0),
            (l, r) => l.or(r),
        };

        let primary = self.primary_side();
        let mut first_event = None;
        let mut hold = None;

        for lane in self.lanes.iter_mut() {
            let input = match lane.side {
                None => combined,
                Some(Side::Left) => left,
                Some(Side::Right) => right,
            };
            let Some(rel) = input else { continue };
            if let Some(side) = lane.side {
                if !self.selection.includes(side) {
                    continue;
                }
            }

            let step = lane.step(&self.config, rel);
            if let Some(percent) = step.hold {
                if let Some(peak) = self.gauge_peaks.iter_mut().find(|p| p.phase == step.phase) {
                    peak.percent = peak.percent.max(percent);
                }
            }
            if lane.side == primary {
                hold = step.hold.map(|percent| (step.phase, percent));
            }
            if let Some(event) = step.event {
                match event {
                    RepEvent::Completed => log::info!(
                        "{}: rep {} completed{}",
                        self.config.kind,
                        lane.counter.get(),
                        lane.side.map(|s| format!(" ({})", s.label())).unwrap_or_default()
                    ),
                    RepEvent::Rejected => log::debug!(
                        "{}: cycle rejected, peak below gate",
                        self.config.kind
                    ),
                }
                if first_event.is_none() {
                    first_event = Some((event, lane.side));
                }
            }
        }

        self.refresh_counts();
        if first_event.map_or(false, |(e, _)| e == RepEvent::Completed) {
            self.state.rep_completed = true;
        }
        (first_event, hold)
    }

    /// Lane whose phase is reported as `SessionState::phase`
    fn primary_side(&self) -> Option<Side> {
        match self.config.tracking {
            Tracking::Combined => None,
            Tracking::PerSide if self.selection.includes(Side::Left) => Some(Side::Left),
            Tracking::PerSide => Some(Side::Right),
        }
    }

    fn lane(&self, side: Option<Side>) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.side == side)
    }

    fn refresh_counts(&mut self) {
        let count = |side| self.lane(side).map_or(0, |l| l.counter.get());
        let reps = match self.config.tracking {
            Tracking::Combined => RepCounts {
                total: count(None),
                left: 0,
                right: 0,
            },
            Tracking::PerSide => {
                let left = count(Some(Side::Left));
                let right = count(Some(Side::Right));
                RepCounts {
                    total: left + right,
                    left,
                    right,
                }
            }
        };
        self.state.reps = reps;

        let primary = self.primary_side();
        self.state.phase = self.lane(primary).and_then(|l| l.classifier.current());
        self.state.side_phases = match self.config.tracking {
            Tracking::Combined => None,
            Tracking::PerSide => Some(SidePhases {
                left: self
                    .lane(Some(Side::Left))
                    .and_then(|l| l.classifier.current()),
                right: self
                    .lane(Some(Side::Right))
                    .and_then(|l| l.classifier.current()),
            }),
        };
    }

    fn compose(
        &self,
        just_ready: bool,
        outcome: Option<(RepEvent, Option<Side>)>,
        hold: Option<(Phase, f32)>,
        message: Option<&str>,
    ) -> String {
        if let Some(message) = message {
            return message.to_string();
        }
        let phase = self.state.phase;
        feedback::compose(&FeedbackInput {
            exercise: self.config.display_name(),
            calibration: self.calibrator.progress(),
            calibrating: !self.calibrator.is_ready(),
            just_ready,
            detected: self.state.detected,
            rep_event: outcome.map(|(event, _)| event),
            rep_side: outcome.and_then(|(_, side)| side),
            rejection_cue: self.config.rep_gate.as_ref().map(|g| g.cue.as_str()),
            hold: hold.and_then(|(phase, percent)| {
                self.config
                    .gauge(phase)
                    .map(|g| (g.label.as_str(), percent))
            }),
            phase,
            phase_cue: phase.and_then(|p| self.config.cue(p)),
        })
    }

    /// Zero all counters and clear history. The baseline is kept.
    pub fn reset(&mut self) {
        for lane in self.lanes.iter_mut() {
            lane.restart();
            lane.counter.reset();
        }
        for peak in self.gauge_peaks.iter_mut() {
            peak.percent = 0.0;
        }
        self.refresh_counts();
        self.state.rep_completed = false;
        self.state.hold_percent = None;
        self.state.feedback = self.compose(false, None, None, Some("Counter reset"));
        log::info!("{}: counters reset", self.config.kind);
    }

    /// Discard the baseline and return to calibration. Counters are kept.
    ///
    /// Absolute-scale exercises keep their zero baseline and stay in
    /// `Tracking`; only in-progress movement is forgotten.
    pub fn recalibrate(&mut self) {
        self.calibrator.reset();
        for lane in self.lanes.iter_mut() {
            lane.restart();
        }
        let ready = self.calibrator.is_ready();
        self.status = if ready {
            SessionStatus::Tracking
        } else {
            SessionStatus::Calibrating
        };
        self.refresh_counts();
        self.state.status = self.status;
        self.state.calibration = self.calibrator.progress();
        self.state.rep_completed = false;
        self.state.hold_percent = None;
        self.state.feedback = self.compose(ready, None, None, None);
        log::info!("{}: recalibration requested", self.config.kind);
    }

    /// Restrict a per-side exercise to one side, or both
    pub fn select_side(&mut self, selection: SideSelection) -> Result<(), SessionError> {
        let per_side = self.config.tracking == Tracking::PerSide
            && self.config.formula.supports_side_selection();
        if !per_side {
            if selection == SideSelection::Both {
                return Ok(());
            }
            return Err(SessionError::SideSelectUnsupported {
                exercise: self.config.kind,
            });
        }
        if selection != self.selection {
            self.selection = selection;
            self.calibrator.track_sides(selection);
            log::info!("{}: tracking {:?}", self.config.kind, selection);
            if self.calibrator.is_ready() && !self.calibrator.covers(selection) {
                // A newly tracked side has no baseline of its own
                self.recalibrate();
                return Ok(());
            }
            for lane in self.lanes.iter_mut() {
                lane.restart();
            }
            self.refresh_counts();
        }
        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> &ExerciseConfig {
        &self.config
    }

    pub fn selection(&self) -> SideSelection {
        self.selection
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.calibrator.baseline().ok()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            exercise: self.config.kind,
            reps: self.state.reps,
            frames_processed: self.frames_processed,
            frames_skipped: self.frames_skipped,
            gauge_peaks: self.gauge_peaks.clone(),
        }
    }
}

/// Baseline-relative values as (left or single, right)
fn relative(value: SampleValue, baseline: Baseline) -> (Option<f32>, Option<f32>) {
    match (value, baseline) {
        (SampleValue::Single(v), Baseline::Single(b)) => (Some(v - b), None),
        (SampleValue::Single(v), Baseline::PerSide { left, right }) => {
            (Some(v - (left + right) / 2.0), None)
        }
        (SampleValue::PerSide { left, right }, Baseline::PerSide { left: bl, right: br }) => {
            (left.map(|l| l - bl), right.map(|r| r - br))
        }
        (SampleValue::PerSide { left, right }, Baseline::Single(b)) => {
            (left.map(|l| l - b), right.map(|r| r - b))
        }
    }
}
