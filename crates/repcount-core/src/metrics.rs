//! Metric extraction: landmark geometry -> scalar movement metric.
//!
//! Each [`MetricFormula`] is a stateless strategy. Adding an exercise means
//! adding a formula variant here, never touching the session pipeline.

use crate::landmarks::{distance, joint_angle, midpoint, Joint, LandmarkFrame};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default minimum detection confidence for a joint to be usable
pub const CONFIDENCE_FLOOR: f32 = 0.5;

/// Floor applied to normalizing distances before division
pub const MIN_NORMALIZER: f32 = 1e-3;

/// Why a required joint could not be used
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LandmarkFault {
    Missing,
    LowConfidence { confidence: f32 },
}

impl fmt::Display for LandmarkFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LandmarkFault::Missing => f.write_str("missing"),
            LandmarkFault::LowConfidence { confidence } => {
                write!(f, "confidence {:.2} below floor", confidence)
            }
        }
    }
}

/// Per-frame extraction failure. Never fatal to a session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("insufficient landmarks: {joint} {fault}")]
    InsufficientLandmarks { joint: Joint, fault: LandmarkFault },
}

impl MetricError {
    /// The joint that made the frame unusable
    pub fn joint(&self) -> Joint {
        match self {
            MetricError::InsufficientLandmarks { joint, .. } => *joint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

/// Which body sides a bilateral exercise tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideSelection {
    #[default]
    Both,
    Left,
    Right,
}

impl SideSelection {
    pub fn includes(self, side: Side) -> bool {
        match self {
            SideSelection::Both => true,
            SideSelection::Left => side == Side::Left,
            SideSelection::Right => side == Side::Right,
        }
    }
}

/// Scalar value(s) of one frame's metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleValue {
    Single(f32),
    /// Per-side values; a side is `None` when it was not selected
    PerSide {
        left: Option<f32>,
        right: Option<f32>,
    },
}

/// Metric derived from one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub value: SampleValue,
    /// A normalizing distance collapsed and was clamped to [`MIN_NORMALIZER`]
    pub degenerate: bool,
}

impl MetricSample {
    pub fn single(value: f32) -> Self {
        Self {
            value: SampleValue::Single(value),
            degenerate: false,
        }
    }

    pub fn per_side(left: Option<f32>, right: Option<f32>) -> Self {
        Self {
            value: SampleValue::PerSide { left, right },
            degenerate: false,
        }
    }

    fn flagged(mut self, degenerate: bool) -> Self {
        self.degenerate = degenerate;
        self
    }
}

/// Named geometry strategies, selected by exercise configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFormula {
    /// 180° minus the mean hip-knee-ankle angle of both legs
    KneeFlexion,
    /// 180° minus the shoulder-elbow-wrist angle, per arm
    ElbowFlexion,
    /// Signed nose offset from the shoulder midline over half the ear span,
    /// as a percentage clamped to [-100, 100]. Negative is a left turn.
    NeckRotation,
    /// Vertical distance between the nose and the shoulder midpoint
    NoseToNeck,
    /// Hip midpoint height minus knee midpoint height
    PelvisToKnee,
    /// Raw shoulder heights, per side
    ShoulderElevation,
    /// Head drop below the shoulder line over torso length. Positive values
    /// track spinal rounding, negative values an arched back.
    SpineFlexion,
}

impl MetricFormula {
    /// Whether samples carry one value per body side
    pub fn is_per_side(self) -> bool {
        matches!(self, MetricFormula::ElbowFlexion | MetricFormula::ShoulderElevation)
    }

    /// Whether each side can be tracked independently of the other
    pub fn supports_side_selection(self) -> bool {
        matches!(self, MetricFormula::ElbowFlexion)
    }

    /// Compute the metric for one frame.
    ///
    /// Fails with [`MetricError`] when any required joint is absent or below
    /// `floor`. Never divides by a collapsed distance.
    pub fn extract(
        self,
        frame: &LandmarkFrame,
        selection: SideSelection,
        floor: f32,
    ) -> Result<MetricSample, MetricError> {
        let pts = JointReader { frame, floor };
        match self {
            MetricFormula::KneeFlexion => {
                let left = joint_angle(
                    pts.at(Joint::LeftHip)?,
                    pts.at(Joint::LeftKnee)?,
                    pts.at(Joint::LeftAnkle)?,
                );
                let right = joint_angle(
                    pts.at(Joint::RightHip)?,
                    pts.at(Joint::RightKnee)?,
                    pts.at(Joint::RightAnkle)?,
                );
                Ok(MetricSample::single(180.0 - (left + right) / 2.0))
            }
            MetricFormula::ElbowFlexion => {
                let left = if selection.includes(Side::Left) {
                    Some(
                        180.0
                            - joint_angle(
                                pts.at(Joint::LeftShoulder)?,
                                pts.at(Joint::LeftElbow)?,
                                pts.at(Joint::LeftWrist)?,
                            ),
                    )
                } else {
                    None
                };
                let right = if selection.includes(Side::Right) {
                    Some(
                        180.0
                            - joint_angle(
                                pts.at(Joint::RightShoulder)?,
                                pts.at(Joint::RightElbow)?,
                                pts.at(Joint::RightWrist)?,
                            ),
                    )
                } else {
                    None
                };
                Ok(MetricSample::per_side(left, right))
            }
            MetricFormula::NeckRotation => {
                let nose = pts.at(Joint::Nose)?;
                let ear_span = distance(pts.at(Joint::LeftEar)?, pts.at(Joint::RightEar)?);
                let shoulders = midpoint(
                    pts.at(Joint::LeftShoulder)?,
                    pts.at(Joint::RightShoulder)?,
                );
                let (half_span, degenerate) = clamp_normalizer(ear_span * 0.5);
                let rotation = ((nose[0] - shoulders[0]) / half_span * 100.0).clamp(-100.0, 100.0);
                Ok(MetricSample::single(rotation).flagged(degenerate))
            }
            MetricFormula::NoseToNeck => {
                let nose = pts.at(Joint::Nose)?;
                let neck = midpoint(
                    pts.at(Joint::LeftShoulder)?,
                    pts.at(Joint::RightShoulder)?,
                );
                Ok(MetricSample::single((nose[1] - neck[1]).abs()))
            }
            MetricFormula::PelvisToKnee => {
                let hips = midpoint(pts.at(Joint::LeftHip)?, pts.at(Joint::RightHip)?);
                let knees = midpoint(pts.at(Joint::LeftKnee)?, pts.at(Joint::RightKnee)?);
                Ok(MetricSample::single(hips[1] - knees[1]))
            }
            MetricFormula::ShoulderElevation => {
                let left = pts.at(Joint::LeftShoulder)?;
                let right = pts.at(Joint::RightShoulder)?;
                Ok(MetricSample::per_side(Some(left[1]), Some(right[1])))
            }
            MetricFormula::SpineFlexion => {
                let nose = pts.at(Joint::Nose)?;
                let shoulders = midpoint(
                    pts.at(Joint::LeftShoulder)?,
                    pts.at(Joint::RightShoulder)?,
                );
                let hips = midpoint(pts.at(Joint::LeftHip)?, pts.at(Joint::RightHip)?);
                let (torso, degenerate) = clamp_normalizer(distance(shoulders, hips));
                Ok(MetricSample::single((nose[1] - shoulders[1]) / torso).flagged(degenerate))
            }
        }
    }
}

struct JointReader<'a> {
    frame: &'a LandmarkFrame,
    floor: f32,
}

impl JointReader<'_> {
    fn at(&self, joint: Joint) -> Result<[f32; 2], MetricError> {
        let lm = self
            .frame
            .get(joint)
            .ok_or(MetricError::InsufficientLandmarks {
                joint,
                fault: LandmarkFault::Missing,
            })?;
        if lm.confidence < self.floor {
            return Err(MetricError::InsufficientLandmarks {
                joint,
                fault: LandmarkFault::LowConfidence {
                    confidence: lm.confidence,
                },
            });
        }
        Ok(lm.point())
    }
}

fn clamp_normalizer(value: f32) -> (f32, bool) {
    if value.is_finite() && value >= MIN_NORMALIZER {
        (value, false)
    } else {
        log::debug!("normalizer {:.5} clamped to {}", value, MIN_NORMALIZER);
        (MIN_NORMALIZER, true)
    }
}
