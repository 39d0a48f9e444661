//! Short status text for the rendering collaborator. Pure functions only.

use crate::calibration::CalibrationProgress;
use crate::matcher::RepEvent;
use crate::metrics::Side;
use crate::phase::Phase;

/// Shown on frames whose required joints were not usable
pub const NO_DETECTION: &str = "No detection";

/// Everything the status line depends on for one frame
#[derive(Debug, Clone, Copy)]
pub struct FeedbackInput<'a> {
    pub exercise: &'a str,
    pub calibration: CalibrationProgress,
    pub calibrating: bool,
    /// Calibration finished on this frame
    pub just_ready: bool,
    pub detected: bool,
    pub rep_event: Option<RepEvent>,
    /// Lane that produced `rep_event`, for bilateral exercises
    pub rep_side: Option<Side>,
    pub rejection_cue: Option<&'a str>,
    /// Gauge label and percentage while a gauged phase is held
    pub hold: Option<(&'a str, f32)>,
    pub phase: Option<Phase>,
    pub phase_cue: Option<&'a str>,
}

/// Pick the status line. Earlier conditions win.
pub fn compose(input: &FeedbackInput<'_>) -> String {
    if input.calibrating {
        return format!(
            "Calibrating... {}/{}",
            input.calibration.current, input.calibration.total
        );
    }
    if input.just_ready {
        return format!("Ready. Begin {}!", input.exercise);
    }
    if !input.detected {
        return NO_DETECTION.to_string();
    }
    match input.rep_event {
        Some(RepEvent::Completed) => {
            return match input.rep_side {
                Some(side) => format!("{} rep completed!", side.label()),
                None => "Rep completed!".to_string(),
            };
        }
        Some(RepEvent::Rejected) => {
            return input.rejection_cue.unwrap_or("Rep not counted").to_string();
        }
        None => {}
    }
    if let Some((label, percent)) = input.hold {
        return format!("{}: {}%", label, percent as u32);
    }
    match (input.phase_cue, input.phase) {
        (Some(cue), _) => cue.to_string(),
        (None, Some(phase)) => phase.to_string(),
        (None, None) => String::new(),
    }
}

/// Linear position of `deflection` between `dead_zone` and
/// `dead_zone + full_scale`, as a percentage clamped to [0, 100].
pub fn hold_percent(deflection: f32, dead_zone: f32, full_scale: f32) -> f32 {
    if !deflection.is_finite() || full_scale <= 0.0 {
        return 0.0;
    }
    ((deflection - dead_zone) / full_scale * 100.0).clamp(0.0, 100.0)
}
