//! Body landmark model.
//!
//! Joint indices follow the 33-point MediaPipe pose topology. Coordinates are
//! normalized image space: x grows to the right, y grows downward, both in
//! [0, 1]. Every landmark carries the detector's confidence (visibility).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// MediaPipe pose landmark indices for the joints this crate reads.
pub mod indices {
    pub const NOSE: usize = 0;
    pub const LEFT_EYE: usize = 2;
    pub const RIGHT_EYE: usize = 5;
    pub const LEFT_EAR: usize = 7;
    pub const RIGHT_EAR: usize = 8;
    pub const MOUTH_LEFT: usize = 9;
    pub const MOUTH_RIGHT: usize = 10;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;

    /// Total landmarks emitted by the pose model
    pub const POSE_LANDMARK_COUNT: usize = 33;
}

/// Named body joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const ALL: [Joint; 19] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::MouthLeft,
        Joint::MouthRight,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Index of this joint in the pose model output
    pub fn index(self) -> usize {
        match self {
            Joint::Nose => indices::NOSE,
            Joint::LeftEye => indices::LEFT_EYE,
            Joint::RightEye => indices::RIGHT_EYE,
            Joint::LeftEar => indices::LEFT_EAR,
            Joint::RightEar => indices::RIGHT_EAR,
            Joint::MouthLeft => indices::MOUTH_LEFT,
            Joint::MouthRight => indices::MOUTH_RIGHT,
            Joint::LeftShoulder => indices::LEFT_SHOULDER,
            Joint::RightShoulder => indices::RIGHT_SHOULDER,
            Joint::LeftElbow => indices::LEFT_ELBOW,
            Joint::RightElbow => indices::RIGHT_ELBOW,
            Joint::LeftWrist => indices::LEFT_WRIST,
            Joint::RightWrist => indices::RIGHT_WRIST,
            Joint::LeftHip => indices::LEFT_HIP,
            Joint::RightHip => indices::RIGHT_HIP,
            Joint::LeftKnee => indices::LEFT_KNEE,
            Joint::RightKnee => indices::RIGHT_KNEE,
            Joint::LeftAnkle => indices::LEFT_ANKLE,
            Joint::RightAnkle => indices::RIGHT_ANKLE,
        }
    }

    pub fn from_index(idx: usize) -> Option<Joint> {
        Joint::ALL.iter().copied().find(|j| j.index() == idx)
    }

    pub fn name(self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEye => "left_eye",
            Joint::RightEye => "right_eye",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::MouthLeft => "mouth_left",
            Joint::MouthRight => "mouth_right",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One detected joint position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Detection confidence (0-1)
    pub confidence: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    pub fn point(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

/// One sampled body pose. Immutable once handed to a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    joints: HashMap<Joint, Landmark>,
}

impl LandmarkFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from raw pose model output rows of `[x, y, visibility]`.
    ///
    /// Rows beyond the model's joint set are ignored; a short slice yields a
    /// frame with only the joints that were present.
    pub fn from_pose_output(rows: &[[f32; 3]]) -> Self {
        let joints = Joint::ALL
            .iter()
            .filter_map(|&joint| {
                rows.get(joint.index())
                    .map(|[x, y, c]| (joint, Landmark::new(*x, *y, *c)))
            })
            .collect();
        Self { joints }
    }

    /// Builder-style insert
    pub fn with(mut self, joint: Joint, landmark: Landmark) -> Self {
        self.joints.insert(joint, landmark);
        self
    }

    pub fn insert(&mut self, joint: Joint, landmark: Landmark) {
        self.joints.insert(joint, landmark);
    }

    pub fn remove(&mut self, joint: Joint) -> Option<Landmark> {
        self.joints.remove(&joint)
    }

    pub fn get(&self, joint: Joint) -> Option<&Landmark> {
        self.joints.get(&joint)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

pub fn midpoint(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0]
}

pub fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

/// Angle at `b` formed by `a-b-c`, in degrees, folded into [0, 180].
pub fn joint_angle(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
    let radians = (c[1] - b[1]).atan2(c[0] - b[0]) - (a[1] - b[1]).atan2(a[0] - b[0]);
    let angle = radians.to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}
