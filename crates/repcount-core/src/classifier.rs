//! Hysteresis phase classification.
//!
//! A single threshold chatters when the metric sits near it: landmark noise
//! flips the phase back and forth and every flip looks like a rep. Each band
//! therefore has a wide enter threshold and a narrower exit threshold, and
//! the classifier remembers which band it is in.

use crate::phase::{Phase, PhaseBand};

/// Per-lane phase classifier. Bilateral exercises run one per side with no
/// shared state.
#[derive(Debug, Clone)]
pub struct PhaseClassifier {
    /// Checked in priority order; extreme bands first
    bands: Vec<PhaseBand>,
    neutral: Phase,
    current: Option<Phase>,
    /// Whether the lane has reached a known position since the last reset
    settled: bool,
}

impl PhaseClassifier {
    pub fn new(bands: Vec<PhaseBand>, neutral: Phase) -> Self {
        Self {
            bands,
            neutral,
            current: None,
            settled: false,
        }
    }

    /// Classify one baseline-relative metric value.
    ///
    /// An active band is held until the value is released past its exit
    /// threshold. Otherwise the first band whose enter threshold is crossed
    /// wins, and the neutral phase is the fallback.
    ///
    /// A fresh classifier only counts as settled once a band is entered or
    /// the value is released by every band. Until then the neutral fallback
    /// is a guess: a limb held halfway is neither extended nor flexed.
    pub fn classify(&mut self, relative: f32) -> Phase {
        if let Some(active) = self.active_band() {
            if !active.released_by(relative) {
                return active.phase;
            }
        }

        let next = self
            .bands
            .iter()
            .find(|band| band.entered_by(relative))
            .map(|band| band.phase)
            .unwrap_or(self.neutral);
        if !self.settled {
            self.settled =
                next != self.neutral || self.bands.iter().all(|b| b.released_by(relative));
        }
        self.current = Some(next);
        next
    }

    /// Phase returned by the last call, if any
    pub fn current(&self) -> Option<Phase> {
        self.current
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn band(&self, phase: Phase) -> Option<&PhaseBand> {
        self.bands.iter().find(|b| b.phase == phase)
    }

    /// Forget the active phase; the next value is classified from scratch
    pub fn reset(&mut self) {
        self.current = None;
        self.settled = false;
    }

    fn active_band(&self) -> Option<&PhaseBand> {
        self.current.and_then(|phase| self.band(phase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat_cow() -> PhaseClassifier {
        PhaseClassifier::new(
            vec![
                PhaseBand::below(Phase::Cow, 0.03, 0.015),
                PhaseBand::above(Phase::Cat, 0.02, 0.01),
            ],
            Phase::Neutral,
        )
    }

    #[test]
    fn test_band_between_exit_and_enter_never_entered() {
        let mut clf = PhaseClassifier::new(
            vec![PhaseBand::above(Phase::Tilted, 0.03, 0.015)],
            Phase::Neutral,
        );
        for i in 0..200 {
            let value = if i % 2 == 0 { 0.020 } else { 0.025 };
            assert_eq!(clf.classify(value), Phase::Neutral);
        }
    }

    #[test]
    fn test_band_held_until_exit() {
        let mut clf = PhaseClassifier::new(
            vec![PhaseBand::above(Phase::Tilted, 0.03, 0.015)],
            Phase::Neutral,
        );
        assert_eq!(clf.classify(0.035), Phase::Tilted);
        // Inside the hysteresis band: stays put
        assert_eq!(clf.classify(0.020), Phase::Tilted);
        assert_eq!(clf.classify(0.016), Phase::Tilted);
        assert_eq!(clf.classify(0.014), Phase::Neutral);
    }

    #[test]
    fn test_multi_band_priority_and_fallback() {
        let mut clf = cat_cow();
        assert_eq!(clf.classify(0.0), Phase::Neutral);
        assert_eq!(clf.classify(-0.05), Phase::Cow);
        assert_eq!(clf.classify(-0.02), Phase::Cow);
        assert_eq!(clf.classify(0.0), Phase::Neutral);
        assert_eq!(clf.classify(0.05), Phase::Cat);
        assert_eq!(clf.classify(0.015), Phase::Cat);
        assert_eq!(clf.classify(0.005), Phase::Neutral);
    }

    #[test]
    fn test_direct_swing_requires_new_enter_threshold() {
        let mut clf = cat_cow();
        assert_eq!(clf.classify(-0.05), Phase::Cow);
        // Released from Cow but short of Cat's enter threshold
        assert_eq!(clf.classify(0.015), Phase::Neutral);
        assert_eq!(clf.classify(-0.05), Phase::Cow);
        assert_eq!(clf.classify(0.05), Phase::Cat);
    }

    #[test]
    fn test_reset_forgets_active_band() {
        let mut clf = cat_cow();
        clf.classify(-0.05);
        assert_eq!(clf.current(), Some(Phase::Cow));
        clf.reset();
        assert_eq!(clf.current(), None);
        assert!(!clf.is_settled());
        assert_eq!(clf.classify(-0.02), Phase::Neutral);
    }

    #[test]
    fn test_settles_only_on_release_or_entry() {
        // Curl flexion: Up above 150, released below 20
        let mut clf = PhaseClassifier::new(
            vec![PhaseBand::above(Phase::Up, 150.0, 20.0)],
            Phase::Down,
        );
        // Half-bent arm: reported as the fallback, not settled
        assert_eq!(clf.classify(90.0), Phase::Down);
        assert!(!clf.is_settled());
        assert_eq!(clf.classify(155.0), Phase::Up);
        assert!(clf.is_settled());

        clf.reset();
        assert_eq!(clf.classify(10.0), Phase::Down);
        assert!(clf.is_settled());
        // Stays settled in the gap between exit and enter
        assert_eq!(clf.classify(90.0), Phase::Down);
        assert!(clf.is_settled());
    }
}
