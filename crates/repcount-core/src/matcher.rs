//! Repetition recognition over the phase history.

use crate::history::PhaseHistory;
use crate::phase::Phase;
use serde::{Deserialize, Serialize};

/// Completed repetitions of one lane. Only the matcher increments it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepCounter {
    count: u32,
}

impl RepCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }
}

/// Outcome of a matched cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepEvent {
    Completed,
    /// The cycle matched but failed the exercise's quality gate
    Rejected,
}

/// Recognizes one completed cycle of movement
#[derive(Debug, Clone, PartialEq)]
pub enum RepPatternMatcher {
    /// The newest history entries must equal `target` exactly
    Sequence { target: Vec<Phase> },
    /// Both extremes must be visited, in any order, before returning to
    /// `neutral`
    BothSides {
        left: Phase,
        right: Phase,
        neutral: Phase,
        seen_left: bool,
        seen_right: bool,
    },
}

impl RepPatternMatcher {
    pub fn sequence(target: Vec<Phase>) -> Self {
        RepPatternMatcher::Sequence { target }
    }

    pub fn both_sides(left: Phase, right: Phase, neutral: Phase) -> Self {
        RepPatternMatcher::BothSides {
            left,
            right,
            neutral,
            seen_left: false,
            seen_right: false,
        }
    }

    /// Inspect the newest classified `phase`, which the caller has already
    /// pushed into `history`.
    ///
    /// On a match the history and any side flags are cleared. The counter is
    /// incremented only when `accept` holds; otherwise the cycle is consumed
    /// and reported as [`RepEvent::Rejected`].
    pub fn observe(
        &mut self,
        phase: Phase,
        history: &mut PhaseHistory,
        counter: &mut RepCounter,
        accept: bool,
    ) -> Option<RepEvent> {
        let matched = match self {
            RepPatternMatcher::Sequence { target } => history.ends_with(target),
            RepPatternMatcher::BothSides {
                left,
                right,
                neutral,
                seen_left,
                seen_right,
            } => {
                if phase == *left {
                    *seen_left = true;
                } else if phase == *right {
                    *seen_right = true;
                }
                if phase == *neutral && *seen_left && *seen_right {
                    *seen_left = false;
                    *seen_right = false;
                    true
                } else {
                    false
                }
            }
        };

        if !matched {
            return None;
        }
        history.clear();
        if accept {
            counter.increment();
            Some(RepEvent::Completed)
        } else {
            Some(RepEvent::Rejected)
        }
    }

    /// Drop any partial progress toward the next rep
    pub fn reset(&mut self) {
        if let RepPatternMatcher::BothSides {
            seen_left,
            seen_right,
            ..
        } = self
        {
            *seen_left = false;
            *seen_right = false;
        }
    }
}
