// Posture heuristics evaluated alongside rep counting

use crate::models::pose::{BodyLandmark, Landmark};
use crate::models::workout::PostureCheck;

pub const KNEES_OVER_TOES_NOTE: &str = "Keep knees aligned with toes";

/// Only evaluated near the bottom of the squat
const KNEE_CHECK_MAX_ANGLE_DEG: f64 = 100.0;
/// Horizontal slack (normalized units) before the knee counts as past the ankle
const KNEE_FORWARD_TOLERANCE: f32 = 0.05;

impl PostureCheck {
    /// Returns a note when the frame shows the flagged form fault.
    ///
    /// `angle` is the tracked joint angle for the same frame. Missing
    /// landmarks yield `None`.
    pub fn evaluate(self, angle: f64, landmarks: &[Landmark]) -> Option<&'static str> {
        match self {
            PostureCheck::KneesOverToes => {
                let knee = BodyLandmark::LeftKnee.get(landmarks)?;
                let ankle = BodyLandmark::LeftAnkle.get(landmarks)?;

                if angle < KNEE_CHECK_MAX_ANGLE_DEG && knee.x > ankle.x + KNEE_FORWARD_TOLERANCE {
                    Some(KNEES_OVER_TOES_NOTE)
                } else {
                    None
                }
            }
        }
    }
}
