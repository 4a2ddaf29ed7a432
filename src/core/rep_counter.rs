// Repetition counter - per-frame hysteresis state machine over a joint angle

use crate::core::angle::angle_at;
use crate::models::pose::Landmark;
use crate::models::workout::ExerciseDefinition;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ==============================================================================
// State & Events
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    #[default]
    Resting,
    Contracted,
}

/// Notifications published while a workout runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RepEvent {
    /// First usable pose of the workout arrived
    PoseDetected,
    /// A rep finished; carries the new total
    RepCompleted(u32),
    /// A posture note was recorded for the first time
    PostureNote(String),
}

/// Side-effect free view of the live counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepSnapshot {
    pub exercise_id: String,
    pub phase: RepPhase,
    pub reps: u32,
    pub posture_notes: Vec<String>,
}

/// What a single frame did to the counter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Unknown exercise or missing landmarks; state untouched
    Skipped,
    Evaluated { angle: f64, rep_completed: bool },
}

// ==============================================================================
// Rep Counter
// ==============================================================================

pub struct RepCounter {
    exercise_id: String,
    exercise: Option<&'static ExerciseDefinition>,
    phase: RepPhase,
    reps: u32,
    posture_notes: Vec<String>,
    events: Option<broadcast::Sender<RepEvent>>,
}

impl RepCounter {
    /// Unknown ids are accepted; every frame is then a no-op.
    pub fn new(exercise_id: &str) -> Self {
        Self {
            exercise_id: exercise_id.to_string(),
            exercise: ExerciseDefinition::lookup(exercise_id),
            phase: RepPhase::Resting,
            reps: 0,
            posture_notes: Vec::new(),
            events: None,
        }
    }

    /// Publish `RepEvent`s on `sender`. Sending never blocks.
    pub fn with_events(mut self, sender: broadcast::Sender<RepEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn exercise_id(&self) -> &str {
        &self.exercise_id
    }

    pub fn exercise(&self) -> Option<&'static ExerciseDefinition> {
        self.exercise
    }

    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    pub fn posture_notes(&self) -> &[String] {
        &self.posture_notes
    }

    pub fn snapshot(&self) -> RepSnapshot {
        RepSnapshot {
            exercise_id: self.exercise_id.clone(),
            phase: self.phase,
            reps: self.reps,
            posture_notes: self.posture_notes.clone(),
        }
    }

    /// Clear reps and notes and return to the resting phase.
    pub fn reset(&mut self) {
        self.phase = RepPhase::Resting;
        self.reps = 0;
        self.posture_notes.clear();
    }

    /// Switch to another exercise and start from a clean state.
    pub fn set_exercise(&mut self, exercise_id: &str) {
        self.exercise_id = exercise_id.to_string();
        self.exercise = ExerciseDefinition::lookup(exercise_id);
        self.reset();
    }

    /// Consume one landmark frame.
    pub fn process(&mut self, landmarks: &[Landmark]) -> FrameOutcome {
        let Some(exercise) = self.exercise else {
            return FrameOutcome::Skipped;
        };

        let [proximal, vertex, distal] = exercise.joint;
        let (Some(a), Some(b), Some(c)) = (
            proximal.get(landmarks),
            vertex.get(landmarks),
            distal.get(landmarks),
        ) else {
            return FrameOutcome::Skipped;
        };

        let angle = angle_at(a, b, c);
        debug!(
            "{} joint angle {:.0}° ({:?})",
            exercise.id, angle, self.phase
        );

        let mut rep_completed = false;
        match self.phase {
            RepPhase::Resting if angle < exercise.contracted_below_deg => {
                self.phase = RepPhase::Contracted;
                debug!("{} entering contracted phase", exercise.id);
            }
            RepPhase::Contracted if angle > exercise.extended_above_deg => {
                self.phase = RepPhase::Resting;
                self.reps = self.reps.saturating_add(1);
                rep_completed = true;
                info!("{} rep completed, total {}", exercise.id, self.reps);
                self.publish(RepEvent::RepCompleted(self.reps));
            }
            _ => {}
        }

        if let Some(check) = exercise.posture_check {
            if let Some(note) = check.evaluate(angle, landmarks) {
                self.add_note(note);
            }
        }

        FrameOutcome::Evaluated {
            angle,
            rep_completed,
        }
    }

    fn add_note(&mut self, note: &str) {
        if self.posture_notes.iter().any(|existing| existing == note) {
            return;
        }
        info!("{} posture note: {}", self.exercise_id, note);
        self.posture_notes.push(note.to_string());
        self.publish(RepEvent::PostureNote(note.to_string()));
    }

    fn publish(&self, event: RepEvent) {
        if let Some(sender) = &self.events {
            // No subscribers is fine
            let _ = sender.send(event);
        }
    }
}
