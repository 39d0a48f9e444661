//! Declarative exercise definitions and the built-in catalogue.

use crate::config::ConfigError;
use crate::metrics::MetricFormula;
use crate::phase::{Phase, PhaseBand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Default calibration window for baseline-relative exercises
pub const DEFAULT_CALIBRATION_WINDOW: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squat,
    BicepCurl,
    NeckRotation,
    ChinTuck,
    PelvicTilt,
    ShoulderShrug,
    CatCow,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 7] = [
        ExerciseKind::Squat,
        ExerciseKind::BicepCurl,
        ExerciseKind::NeckRotation,
        ExerciseKind::ChinTuck,
        ExerciseKind::PelvicTilt,
        ExerciseKind::ShoulderShrug,
        ExerciseKind::CatCow,
    ];

    /// Stable identifier, also the key under `[exercises]` in config files
    pub fn id(self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::BicepCurl => "bicep_curl",
            ExerciseKind::NeckRotation => "neck_rotation",
            ExerciseKind::ChinTuck => "chin_tuck",
            ExerciseKind::PelvicTilt => "pelvic_tilt",
            ExerciseKind::ShoulderShrug => "shoulder_shrug",
            ExerciseKind::CatCow => "cat_cow",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ExerciseKind::Squat => "Squats",
            ExerciseKind::BicepCurl => "Bicep Curls",
            ExerciseKind::NeckRotation => "Neck Rotations",
            ExerciseKind::ChinTuck => "Chin Tucks",
            ExerciseKind::PelvicTilt => "Pelvic Tilts",
            ExerciseKind::ShoulderShrug => "Shoulder Shrugs",
            ExerciseKind::CatCow => "Cat-Cow",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ExerciseKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        ExerciseKind::ALL
            .iter()
            .copied()
            .find(|k| k.id() == wanted)
            .ok_or_else(|| ConfigError::Validation(format!("unknown exercise: {}", s)))
    }
}

/// How per-side samples feed the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tracking {
    /// One lane. Per-side samples are averaged after baseline subtraction.
    #[default]
    Combined,
    /// One independent lane per body side, each with its own counter
    PerSide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CountingRule {
    /// Newest history entries must equal `target`
    Sequence { target: Vec<Phase> },
    /// Visit both extremes, then return to the neutral phase
    BothSides { left: Phase, right: Phase },
}

/// Percentage gauge shown while `phase` is held
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldGauge {
    pub phase: Phase,
    pub label: String,
    /// Deflection that reads as 0%
    #[serde(default)]
    pub dead_zone: f32,
    /// Deflection past `dead_zone` that reads as 100%
    pub full_scale: f32,
}

/// Minimum gauge peak a cycle must reach to count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepGate {
    pub min_percent: f32,
    pub cue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseCue {
    pub phase: Phase,
    pub text: String,
}

/// Everything that distinguishes one exercise from another. Immutable for a
/// session's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseConfig {
    pub kind: ExerciseKind,
    pub formula: MetricFormula,
    pub calibration_window: usize,
    #[serde(default)]
    pub tracking: Tracking,
    /// Priority order: first entered band wins
    pub bands: Vec<PhaseBand>,
    pub neutral: Phase,
    pub counting: CountingRule,
    pub history_capacity: usize,
    #[serde(default)]
    pub gauges: Vec<HoldGauge>,
    #[serde(default)]
    pub rep_gate: Option<RepGate>,
    #[serde(default)]
    pub cues: Vec<PhaseCue>,
}

fn cue(phase: Phase, text: &str) -> PhaseCue {
    PhaseCue {
        phase,
        text: text.to_string(),
    }
}

fn gauge(phase: Phase, label: &str, dead_zone: f32, full_scale: f32) -> HoldGauge {
    HoldGauge {
        phase,
        label: label.to_string(),
        dead_zone,
        full_scale,
    }
}

impl ExerciseConfig {
    /// Reference definition of a built-in exercise
    pub fn builtin(kind: ExerciseKind) -> Self {
        match kind {
            // Knee flexion of 40° is a 140° knee; 30° releases at 150°
            ExerciseKind::Squat => Self {
                kind,
                formula: MetricFormula::KneeFlexion,
                calibration_window: 0,
                tracking: Tracking::Combined,
                bands: vec![PhaseBand::above(Phase::Down, 40.0, 30.0)],
                neutral: Phase::Up,
                counting: CountingRule::Sequence {
                    target: vec![Phase::Down, Phase::Up],
                },
                history_capacity: 3,
                gauges: vec![gauge(Phase::Down, "Depth", 10.0, 80.0)],
                rep_gate: Some(RepGate {
                    min_percent: 40.0,
                    cue: "Go deeper".to_string(),
                }),
                cues: vec![cue(Phase::Up, "Ready")],
            },
            // Curled below 30° elbow angle, extended above 160°
            ExerciseKind::BicepCurl => Self {
                kind,
                formula: MetricFormula::ElbowFlexion,
                calibration_window: 0,
                tracking: Tracking::PerSide,
                bands: vec![PhaseBand::above(Phase::Up, 150.0, 20.0)],
                neutral: Phase::Down,
                counting: CountingRule::Sequence {
                    target: vec![Phase::Down, Phase::Up],
                },
                history_capacity: 3,
                gauges: Vec::new(),
                rep_gate: None,
                cues: vec![cue(Phase::Up, "Curl up"), cue(Phase::Down, "Extend fully")],
            },
            ExerciseKind::NeckRotation => Self {
                kind,
                formula: MetricFormula::NeckRotation,
                calibration_window: 0,
                tracking: Tracking::Combined,
                bands: vec![
                    PhaseBand::below(Phase::RotatingLeft, 40.0, 20.0),
                    PhaseBand::above(Phase::RotatingRight, 40.0, 20.0),
                ],
                neutral: Phase::Center,
                counting: CountingRule::BothSides {
                    left: Phase::RotatingLeft,
                    right: Phase::RotatingRight,
                },
                history_capacity: 3,
                gauges: vec![
                    gauge(Phase::RotatingLeft, "Left rotation", 0.0, 100.0),
                    gauge(Phase::RotatingRight, "Right rotation", 0.0, 100.0),
                ],
                rep_gate: None,
                cues: vec![cue(Phase::Center, "Ready")],
            },
            ExerciseKind::ChinTuck => Self {
                kind,
                formula: MetricFormula::NoseToNeck,
                calibration_window: DEFAULT_CALIBRATION_WINDOW,
                tracking: Tracking::Combined,
                bands: vec![PhaseBand::below(Phase::Tucked, 0.04, 0.02)],
                neutral: Phase::Neutral,
                counting: CountingRule::Sequence {
                    target: vec![Phase::Tucked, Phase::Neutral],
                },
                history_capacity: 3,
                gauges: vec![gauge(Phase::Tucked, "Hold tuck", 0.0, 0.08)],
                rep_gate: None,
                cues: vec![
                    cue(Phase::Tucked, "Chin tucked - good!"),
                    cue(Phase::Neutral, "Ready to start"),
                ],
            },
            ExerciseKind::PelvicTilt => Self {
                kind,
                formula: MetricFormula::PelvisToKnee,
                calibration_window: DEFAULT_CALIBRATION_WINDOW,
                tracking: Tracking::Combined,
                bands: vec![PhaseBand::above(Phase::Tilted, 0.025, 0.0125)],
                neutral: Phase::Neutral,
                counting: CountingRule::Sequence {
                    target: vec![Phase::Neutral, Phase::Tilted, Phase::Neutral],
                },
                history_capacity: 3,
                gauges: Vec::new(),
                rep_gate: None,
                cues: vec![
                    cue(Phase::Tilted, "Pelvis tilted"),
                    cue(Phase::Neutral, "Neutral position"),
                ],
            },
            // Shoulders rise toward the top of the image, so up is below baseline
            ExerciseKind::ShoulderShrug => Self {
                kind,
                formula: MetricFormula::ShoulderElevation,
                calibration_window: DEFAULT_CALIBRATION_WINDOW,
                tracking: Tracking::Combined,
                bands: vec![PhaseBand::below(Phase::Up, 0.015, 0.005)],
                neutral: Phase::Down,
                counting: CountingRule::Sequence {
                    target: vec![Phase::Up, Phase::Down],
                },
                history_capacity: 3,
                gauges: vec![gauge(Phase::Up, "Hold shrug", 0.0, 0.045)],
                rep_gate: None,
                cues: vec![
                    cue(Phase::Up, "Shoulders up - good!"),
                    cue(Phase::Down, "Return to rest position"),
                ],
            },
            ExerciseKind::CatCow => Self {
                kind,
                formula: MetricFormula::SpineFlexion,
                calibration_window: DEFAULT_CALIBRATION_WINDOW,
                tracking: Tracking::Combined,
                bands: vec![
                    PhaseBand::below(Phase::Cow, 0.03, 0.015),
                    PhaseBand::above(Phase::Cat, 0.02, 0.01),
                ],
                neutral: Phase::Neutral,
                counting: CountingRule::Sequence {
                    target: vec![Phase::Cow, Phase::Neutral, Phase::Cat, Phase::Neutral],
                },
                history_capacity: 5,
                gauges: Vec::new(),
                rep_gate: None,
                cues: vec![
                    cue(Phase::Cow, "Cow position (arch back)"),
                    cue(Phase::Cat, "Cat position (round spine)"),
                    cue(Phase::Neutral, "Neutral position"),
                ],
            },
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.kind.display_name()
    }

    /// Phases this exercise's classifier can produce
    pub fn defined_phases(&self) -> BTreeSet<Phase> {
        self.bands
            .iter()
            .map(|b| b.phase)
            .chain(std::iter::once(self.neutral))
            .collect()
    }

    pub fn band(&self, phase: Phase) -> Option<&PhaseBand> {
        self.bands.iter().find(|b| b.phase == phase)
    }

    pub fn gauge(&self, phase: Phase) -> Option<&HoldGauge> {
        self.gauges.iter().find(|g| g.phase == phase)
    }

    pub fn cue(&self, phase: Phase) -> Option<&str> {
        self.cues
            .iter()
            .find(|c| c.phase == phase)
            .map(|c| c.text.as_str())
    }

    /// Reject definitions that would break classification or counting.
    /// Runs at session construction, never per frame.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let exercise = self.kind.id().to_string();

        if self.bands.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{}: at least one phase band is required",
                exercise
            )));
        }
        for band in &self.bands {
            if !band.is_hysteretic() {
                return Err(ConfigError::Hysteresis {
                    exercise,
                    phase: band.phase,
                    enter: band.enter,
                    exit: band.exit,
                });
            }
        }
        let mut seen = BTreeSet::new();
        for band in &self.bands {
            if band.phase == self.neutral || !seen.insert(band.phase) {
                return Err(ConfigError::Validation(format!(
                    "{}: phase {} is defined more than once",
                    exercise, band.phase
                )));
            }
        }

        let defined = self.defined_phases();
        let undefined = |phase: Phase| ConfigError::UndefinedPhase {
            exercise: exercise.clone(),
            phase,
        };

        match &self.counting {
            CountingRule::Sequence { target } => {
                if target.is_empty() {
                    return Err(ConfigError::EmptySequence {
                        exercise: exercise.clone(),
                    });
                }
                if let Some(&phase) = target.iter().find(|p| !defined.contains(p)) {
                    return Err(undefined(phase));
                }
                if self.history_capacity < target.len() {
                    return Err(ConfigError::HistoryCapacity {
                        exercise: exercise.clone(),
                        capacity: self.history_capacity,
                        pattern: target.len(),
                    });
                }
            }
            CountingRule::BothSides { left, right } => {
                for phase in [*left, *right] {
                    if self.band(phase).is_none() {
                        return Err(undefined(phase));
                    }
                }
                if left == right {
                    return Err(ConfigError::Validation(format!(
                        "{}: both-sides counting needs two distinct phases",
                        exercise
                    )));
                }
                if self.history_capacity == 0 {
                    return Err(ConfigError::HistoryCapacity {
                        exercise: exercise.clone(),
                        capacity: 0,
                        pattern: 1,
                    });
                }
            }
        }

        for g in &self.gauges {
            if self.band(g.phase).is_none() {
                return Err(undefined(g.phase));
            }
            if !(g.full_scale.is_finite() && g.full_scale > 0.0) || g.dead_zone < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{}: gauge {:?} needs full_scale > 0 and dead_zone >= 0",
                    exercise, g.label
                )));
            }
        }

        if let Some(gate) = &self.rep_gate {
            if self.gauges.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{}: rep_gate requires a hold gauge",
                    exercise
                )));
            }
            if !(0.0..=100.0).contains(&gate.min_percent) {
                return Err(ConfigError::Validation(format!(
                    "{}: rep_gate.min_percent must be in [0, 100]",
                    exercise
                )));
            }
        }

        if let Some(c) = self.cues.iter().find(|c| !defined.contains(&c.phase)) {
            return Err(undefined(c.phase));
        }

        if self.tracking == Tracking::PerSide && !self.formula.is_per_side() {
            return Err(ConfigError::Validation(format!(
                "{}: per-side tracking needs a per-side formula, {:?} yields one value",
                exercise, self.formula
            )));
        }

        Ok(())
    }
}
