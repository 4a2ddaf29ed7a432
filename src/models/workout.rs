// Data models for exercises, finished workouts and workout history

use crate::models::pose::BodyLandmark;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Exercise Catalog
// ==============================================================================

/// Form heuristics attached to an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureCheck {
    /// Knee drifting past the ankle at the bottom of a squat
    KneesOverToes,
}

/// Static configuration for one supported exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExerciseDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub standing_guide: &'static str,
    /// Proximal, vertex and distal landmark of the tracked joint
    pub joint: [BodyLandmark; 3],
    /// Enter the contracted phase when the joint angle drops below this
    pub contracted_below_deg: f64,
    /// Count a rep when the joint angle rises above this while contracted
    pub extended_above_deg: f64,
    pub posture_check: Option<PostureCheck>,
}

pub const EXERCISES: [ExerciseDefinition; 3] = [
    ExerciseDefinition {
        id: "squats",
        name: "Squats",
        description: "Lower body strength exercise",
        standing_guide: "Stand facing the camera with feet shoulder-width apart",
        joint: [
            BodyLandmark::LeftHip,
            BodyLandmark::LeftKnee,
            BodyLandmark::LeftAnkle,
        ],
        contracted_below_deg: 120.0,
        extended_above_deg: 150.0,
        posture_check: Some(PostureCheck::KneesOverToes),
    },
    ExerciseDefinition {
        id: "pushups",
        name: "Push-ups",
        description: "Upper body and core strength",
        standing_guide: "Position yourself sideways to the camera in plank position",
        joint: [
            BodyLandmark::LeftShoulder,
            BodyLandmark::LeftElbow,
            BodyLandmark::LeftWrist,
        ],
        contracted_below_deg: 110.0,
        extended_above_deg: 150.0,
        posture_check: None,
    },
    ExerciseDefinition {
        id: "bicep_curls",
        name: "Bicep Curls",
        description: "Arm strength exercise",
        standing_guide: "Stand sideways to the camera with arms at your sides",
        joint: [
            BodyLandmark::LeftShoulder,
            BodyLandmark::LeftElbow,
            BodyLandmark::LeftWrist,
        ],
        contracted_below_deg: 110.0,
        extended_above_deg: 150.0,
        posture_check: None,
    },
];

impl ExerciseDefinition {
    /// Find an exercise by its identifier. Unknown ids yield `None`.
    pub fn lookup(id: &str) -> Option<&'static ExerciseDefinition> {
        EXERCISES.iter().find(|exercise| exercise.id == id)
    }

    pub fn all() -> &'static [ExerciseDefinition] {
        &EXERCISES
    }
}

// ==============================================================================
// Workout Record
// ==============================================================================

/// Immutable summary of one completed workout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    pub exercise_type: String,
    pub reps: u32,
    pub duration: u64, // Whole seconds
    pub timestamp: DateTime<Utc>,
    pub posture_score: u32,
    pub posture_notes: Vec<String>,
}

pub const MIN_POSTURE_SCORE: u32 = 70;
pub const MAX_POSTURE_SCORE: u32 = 100;
const POSTURE_NOTE_PENALTY: u32 = 5;

/// `max(70, 100 - 5 * note_count)`
pub fn posture_score(distinct_note_count: usize) -> u32 {
    let count = u32::try_from(distinct_note_count).unwrap_or(u32::MAX);
    MAX_POSTURE_SCORE
        .saturating_sub(count.saturating_mul(POSTURE_NOTE_PENALTY))
        .max(MIN_POSTURE_SCORE)
}

// ==============================================================================
// History Summary
// ==============================================================================

/// Aggregate totals over the stored workout history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    pub total_workouts: usize,
    pub total_reps: u64,
    pub total_minutes: u64,
    /// Mean posture score rounded to nearest; 0 with no history
    pub average_posture_score: u32,
    pub latest: Option<WorkoutRecord>,
}

impl WorkoutSummary {
    /// `records` must be in insertion order; the last one is reported as latest.
    pub fn from_records(records: &[WorkoutRecord]) -> Self {
        let total_reps = records.iter().map(|w| u64::from(w.reps)).sum();
        let total_secs: u64 = records.iter().map(|w| w.duration).sum();
        let score_sum: u64 = records.iter().map(|w| u64::from(w.posture_score)).sum();
        let count = records.len() as u64;
        let average_posture_score = if count == 0 {
            0
        } else {
            u32::try_from((score_sum + count / 2) / count).unwrap_or(MAX_POSTURE_SCORE)
        };

        Self {
            total_workouts: records.len(),
            total_reps,
            total_minutes: (total_secs + 30) / 60,
            average_posture_score,
            latest: records.last().cloned(),
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WorkoutError {
    #[error("A workout is already in progress")]
    AlreadyActive,

    #[error("No workout in progress")]
    NotActive,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt workout record: {0}")]
    CorruptRecord(String),

    #[error("Failed to save workout {}: {}", .record.id, .source)]
    SaveFailed {
        record: Box<WorkoutRecord>,
        source: Box<WorkoutError>,
    },
}

pub type WorkoutResult<T> = Result<T, WorkoutError>;
