//! Personal baseline estimation.
//!
//! The first `window` usable samples of a session are averaged into a
//! baseline. Exercises measured on an absolute scale use a zero window and
//! are ready immediately with a zero baseline. Per-side baselines are not
//! produced until every tracked side has contributed a sample.

use crate::metrics::{SampleValue, Side, SideSelection};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationProgress {
    pub current: usize,
    pub total: usize,
}

impl CalibrationProgress {
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// Baseline requested before the calibration window filled
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("calibration incomplete: {seen}/{total} samples")]
pub struct CalibrationIncomplete {
    pub seen: usize,
    pub total: usize,
}

/// Resting-position reference. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Baseline {
    Single(f32),
    PerSide { left: f32, right: f32 },
}

impl Baseline {
    fn zero(per_side: bool) -> Self {
        if per_side {
            Baseline::PerSide {
                left: 0.0,
                right: 0.0,
            }
        } else {
            Baseline::Single(0.0)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, value: Option<f32>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v as f64;
            self.count += 1;
        }
    }

    fn mean(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum / self.count as f64) as f32
        }
    }
}

#[derive(Debug, Clone)]
pub struct Calibrator {
    window: usize,
    per_side: bool,
    sides: SideSelection,
    seen: usize,
    left: Accumulator,
    right: Accumulator,
    baseline: Option<Baseline>,
}

impl Calibrator {
    /// `per_side` keeps a separate mean for each body side
    pub fn new(window: usize, per_side: bool) -> Self {
        let mut calibrator = Self {
            window,
            per_side,
            sides: SideSelection::Both,
            seen: 0,
            left: Accumulator::default(),
            right: Accumulator::default(),
            baseline: None,
        };
        calibrator.reset();
        calibrator
    }

    /// Feed one sample. Returns true on the sample that completes the window.
    ///
    /// Samples arriving after the baseline is ready are ignored.
    pub fn observe(&mut self, value: &SampleValue) -> bool {
        if self.baseline.is_some() {
            return false;
        }

        match *value {
            SampleValue::Single(v) => self.left.add(Some(v)),
            SampleValue::PerSide { left, right } => {
                self.left.add(left);
                self.right.add(right);
            }
        }
        self.seen += 1;

        if self.seen < self.window || !self.covers(self.sides) {
            return false;
        }

        let baseline = if self.per_side {
            Baseline::PerSide {
                left: self.left.mean(),
                right: self.right.mean(),
            }
        } else {
            Baseline::Single(self.left.mean())
        };
        log::info!("calibration complete after {} samples: {:?}", self.seen, baseline);
        self.baseline = Some(baseline);
        true
    }

    pub fn baseline(&self) -> Result<Baseline, CalibrationIncomplete> {
        self.baseline.ok_or(CalibrationIncomplete {
            seen: self.seen,
            total: self.window,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn progress(&self) -> CalibrationProgress {
        CalibrationProgress {
            current: self.seen.min(self.window),
            total: self.window,
        }
    }

    /// Sides whose samples must be present before a per-side baseline is
    /// produced
    pub fn track_sides(&mut self, sides: SideSelection) {
        self.sides = sides;
    }

    /// Whether the samples seen so far give a baseline for every side in
    /// `sides`. Absolute-scale and single-valued calibrators always do.
    pub fn covers(&self, sides: SideSelection) -> bool {
        if self.window == 0 || !self.per_side {
            return true;
        }
        [(Side::Left, &self.left), (Side::Right, &self.right)]
            .iter()
            .all(|(side, acc)| !sides.includes(*side) || acc.count > 0)
    }

    /// Discard the accumulator and any baseline
    pub fn reset(&mut self) {
        self.seen = 0;
        self.left = Accumulator::default();
        self.right = Accumulator::default();
        self.baseline = if self.window == 0 {
            Some(Baseline::zero(self.per_side))
        } else {
            None
        };
    }
}
