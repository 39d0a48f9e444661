use proptest::prelude::*;

/// Property-based checks of the counting invariants

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PhaseClassifier;
    use crate::exercise::{ExerciseConfig, ExerciseKind};
    use crate::landmarks::{Joint, Landmark, LandmarkFrame};
    use crate::phase::{Phase, PhaseBand};
    use crate::session::{ExerciseSession, SessionStatus};
    use crate::SessionConfig;

    /// Pelvic-tilt frame whose hip-to-knee metric equals `metric`
    fn pelvis_frame(metric: f32, knee_confidence: f32) -> LandmarkFrame {
        let knee_y = 0.7;
        let hip_y = knee_y + metric;
        LandmarkFrame::new()
            .with(Joint::LeftHip, Landmark::new(0.4, hip_y, 0.9))
            .with(Joint::RightHip, Landmark::new(0.6, hip_y, 0.9))
            .with(Joint::LeftKnee, Landmark::new(0.4, knee_y, knee_confidence))
            .with(Joint::RightKnee, Landmark::new(0.6, knee_y, knee_confidence))
    }

    fn calibrated_pelvic_session() -> ExerciseSession {
        let mut cfg = ExerciseConfig::builtin(ExerciseKind::PelvicTilt);
        cfg.calibration_window = 3;
        let mut session = ExerciseSession::new(cfg, &SessionConfig::default()).unwrap();
        for _ in 0..3 {
            session.advance(&pelvis_frame(-0.2, 0.9));
        }
        assert_eq!(session.status(), SessionStatus::Tracking);
        session
    }

    // =========================================================================
    // Repetition count never decreases between resets
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_rep_count_monotonic(
            offsets in prop::collection::vec(-0.08f32..0.08f32, 1..200),
            dropouts in prop::collection::vec(any::<bool>(), 200),
        ) {
            let mut session = calibrated_pelvic_session();
            let mut last = 0;
            for (i, offset) in offsets.iter().enumerate() {
                let confidence = if dropouts[i] && i % 7 == 0 { 0.1 } else { 0.9 };
                let state = session.advance(&pelvis_frame(-0.2 + offset, confidence));
                prop_assert!(state.reps.total >= last);
                prop_assert!(state.reps.total <= last + 1);
                last = state.reps.total;
            }
        }
    }

    // =========================================================================
    // A static pose never produces reps
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_static_input_idempotent(
            offset in -0.1f32..0.1f32,
            frames in 1usize..100,
        ) {
            let mut session = calibrated_pelvic_session();
            let first = session.advance(&pelvis_frame(-0.2 + offset, 0.9));
            for _ in 0..frames {
                let state = session.advance(&pelvis_frame(-0.2 + offset, 0.9));
                prop_assert_eq!(state.reps.total, first.reps.total);
                prop_assert_eq!(state.phase, first.phase);
            }
        }
    }

    // =========================================================================
    // Values between exit and enter never enter a band from outside
    // =========================================================================
    proptest! {
        #[test]
        fn test_hysteresis_band_never_entered(
            values in prop::collection::vec(0.0151f32..0.0299f32, 1..300),
        ) {
            let mut clf = PhaseClassifier::new(
                vec![PhaseBand::above(Phase::Tilted, 0.03, 0.015)],
                Phase::Neutral,
            );
            for v in values {
                prop_assert_eq!(clf.classify(v), Phase::Neutral);
            }
        }

        #[test]
        fn test_hysteresis_band_never_left(
            values in prop::collection::vec(0.0151f32..0.0299f32, 1..300),
        ) {
            let mut clf = PhaseClassifier::new(
                vec![PhaseBand::above(Phase::Tilted, 0.03, 0.015)],
                Phase::Neutral,
            );
            prop_assert_eq!(clf.classify(0.05), Phase::Tilted);
            for v in values {
                prop_assert_eq!(clf.classify(v), Phase::Tilted);
            }
        }
    }
}
