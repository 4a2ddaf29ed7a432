// Data models for body landmarks delivered by the upstream pose estimator

use serde::{Deserialize, Serialize};

// ==============================================================================
// Pose Frame
// ==============================================================================

/// One detected pose for a single video frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseFrame {
    pub timestamp_ms: i64,        // Capture time of the source video frame
    pub landmarks: Vec<Landmark>, // 33 body landmarks, indexed by `BodyLandmark`
}

impl PoseFrame {
    pub fn new(timestamp_ms: i64, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ms,
            landmarks,
        }
    }

    /// Look up a landmark by anatomical index. `None` when the frame is short.
    pub fn landmark(&self, which: BodyLandmark) -> Option<&Landmark> {
        which.get(&self.landmarks)
    }
}

// ==============================================================================
// Landmark
// ==============================================================================

/// A body landmark with optional visibility score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32, // Normalized [0, 1] for image coordinates
    pub y: f32, // Normalized [0, 1] for image coordinates
    pub z: f32, // Depth relative to the hip midpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>, // Visibility confidence [0, 1]
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// MediaPipe Pose Landmark indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    pub const COUNT: usize = 33;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn get(self, landmarks: &[Landmark]) -> Option<&Landmark> {
        landmarks.get(self.index())
    }
}
