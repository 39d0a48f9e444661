//! Discrete movement phases and the hysteresis bands that define them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Movement phase label. Each exercise uses a small subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Up,
    Down,
    Neutral,
    Center,
    RotatingLeft,
    RotatingRight,
    Tucked,
    Tilted,
    Cat,
    Cow,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Up => "up",
            Phase::Down => "down",
            Phase::Neutral => "neutral",
            Phase::Center => "center",
            Phase::RotatingLeft => "rotating_left",
            Phase::RotatingRight => "rotating_right",
            Phase::Tucked => "tucked",
            Phase::Tilted => "tilted",
            Phase::Cat => "cat",
            Phase::Cow => "cow",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Side of the baseline a band lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Above,
    Below,
}

/// Hysteresis band for one non-neutral phase.
///
/// `enter` and `exit` are magnitudes measured from the baseline in
/// `direction`, with `enter > exit >= 0`. The phase is entered once the
/// relative metric passes `enter` and held until it falls back inside `exit`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseBand {
    pub phase: Phase,
    pub direction: Direction,
    pub enter: f32,
    pub exit: f32,
}

impl PhaseBand {
    pub fn above(phase: Phase, enter: f32, exit: f32) -> Self {
        Self {
            phase,
            direction: Direction::Above,
            enter,
            exit,
        }
    }

    pub fn below(phase: Phase, enter: f32, exit: f32) -> Self {
        Self {
            phase,
            direction: Direction::Below,
            enter,
            exit,
        }
    }

    /// Relative metric is strictly past the enter threshold
    pub fn entered_by(&self, relative: f32) -> bool {
        match self.direction {
            Direction::Above => relative > self.enter,
            Direction::Below => relative < -self.enter,
        }
    }

    /// Relative metric has come back strictly inside the exit threshold
    pub fn released_by(&self, relative: f32) -> bool {
        match self.direction {
            Direction::Above => relative < self.exit,
            Direction::Below => relative > -self.exit,
        }
    }

    /// Distance of `relative` from the baseline in this band's direction
    pub fn deflection(&self, relative: f32) -> f32 {
        match self.direction {
            Direction::Above => relative,
            Direction::Below => -relative,
        }
    }

    /// Hysteresis requires a strictly wider enter threshold
    pub fn is_hysteretic(&self) -> bool {
        self.enter.is_finite() && self.exit.is_finite() && self.exit >= 0.0 && self.enter > self.exit
    }
}
