// Workout session - one running workout, frame throttling and record persistence

use crate::core::config::Config;
use crate::core::rep_counter::{RepCounter, RepEvent, RepSnapshot};
use crate::core::workout_store::WorkoutStore;
use crate::models::pose::PoseFrame;
use crate::models::workout::{
    posture_score, ExerciseDefinition, WorkoutError, WorkoutRecord, WorkoutResult,
};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

const FRAME_QUEUE_CAPACITY: usize = 100;
const EVENT_CHANNEL_CAPACITY: usize = 64;

struct ActiveWorkout {
    exercise_id: String,
    started: Instant,
    last_accepted_ms: Option<i64>,
    frame_tx: mpsc::Sender<PoseFrame>,
    worker: JoinHandle<()>,
}

/// Runs one workout at a time: throttles incoming frames, feeds them to the
/// rep counter in arrival order and persists the finished record.
pub struct WorkoutSession {
    store: Arc<dyn WorkoutStore>,
    target_fps: i128,
    counter: Arc<Mutex<RepCounter>>,
    active: Mutex<Option<ActiveWorkout>>,
    events: broadcast::Sender<RepEvent>,
}

impl WorkoutSession {
    pub fn new(store: Arc<dyn WorkoutStore>, config: &Config) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let counter = RepCounter::new(&config.default_exercise).with_events(events.clone());

        Self {
            store,
            target_fps: i128::from(config.target_fps.max(1)),
            counter: Arc::new(Mutex::new(counter)),
            active: Mutex::new(None),
            events,
        }
    }

    /// Receive rep, posture and pose-ready notifications
    pub fn subscribe(&self) -> broadcast::Receiver<RepEvent> {
        self.events.subscribe()
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Current count and notes; no side effects
    pub async fn snapshot(&self) -> RepSnapshot {
        self.counter.lock().await.snapshot()
    }

    /// Start a workout for `exercise_id`, clearing any previous counter state
    pub async fn start_workout(&self, exercise_id: &str) -> WorkoutResult<()> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(WorkoutError::AlreadyActive);
        }

        if ExerciseDefinition::lookup(exercise_id).is_none() {
            warn!("Unknown exercise '{}'; frames will not be counted", exercise_id);
        }

        self.counter.lock().await.set_exercise(exercise_id);

        let (frame_tx, frame_rx) = mpsc::channel::<PoseFrame>(FRAME_QUEUE_CAPACITY);
        let worker = tokio::spawn(Self::process_frames(
            frame_rx,
            self.counter.clone(),
            self.events.clone(),
        ));

        *active = Some(ActiveWorkout {
            exercise_id: exercise_id.to_string(),
            started: Instant::now(),
            last_accepted_ms: None,
            frame_tx,
            worker,
        });

        info!("Started workout: {}", exercise_id);
        Ok(())
    }

    /// Queue a frame for processing.
    ///
    /// Returns `false` when no workout is running, or the frame is older than
    /// or less than one frame period after the last accepted one.
    pub async fn submit_frame(&self, frame: PoseFrame) -> bool {
        let mut guard = self.active.lock().await;
        let Some(active) = guard.as_mut() else {
            return false;
        };

        if let Some(last) = active.last_accepted_ms {
            if !self.frame_due(last, frame.timestamp_ms) {
                return false;
            }
        }
        active.last_accepted_ms = Some(frame.timestamp_ms);

        // Sent under the lock so concurrent callers cannot reorder frames
        if active.frame_tx.send(frame).await.is_err() {
            error!("Frame worker stopped before the workout ended");
            return false;
        }
        true
    }

    /// `gap * fps >= 1000`, so the period is never truncated to whole ms
    fn frame_due(&self, last_ms: i64, next_ms: i64) -> bool {
        let gap = i128::from(next_ms) - i128::from(last_ms);
        gap >= 0 && gap * self.target_fps >= 1000
    }

    /// Finish the workout: drain queued frames, build the record and store it.
    ///
    /// The session is idle afterwards even when saving fails; the record is
    /// then returned inside `WorkoutError::SaveFailed`.
    pub async fn stop_workout(&self) -> WorkoutResult<WorkoutRecord> {
        let mut guard = self.active.lock().await;
        let ActiveWorkout {
            exercise_id,
            started,
            frame_tx,
            worker,
            ..
        } = guard.take().ok_or(WorkoutError::NotActive)?;

        drop(frame_tx);
        if let Err(e) = worker.await {
            error!("Frame worker ended abnormally: {}", e);
        }

        let elapsed_ms = started.elapsed().as_millis();
        let duration = u64::try_from((elapsed_ms + 500) / 1000).unwrap_or(u64::MAX);
        let snapshot = self.counter.lock().await.snapshot();

        let record = WorkoutRecord {
            id: Uuid::new_v4().to_string(),
            exercise_type: exercise_id,
            reps: snapshot.reps,
            duration,
            timestamp: Utc::now(),
            posture_score: posture_score(snapshot.posture_notes.len()),
            posture_notes: snapshot.posture_notes,
        };

        if let Err(e) = self.store.save_workout(&record).await {
            error!("Failed to save workout {}: {}", record.id, e);
            return Err(WorkoutError::SaveFailed {
                record: Box::new(record),
                source: Box::new(e),
            });
        }
        drop(guard);

        info!(
            "Workout complete: {} reps of {} in {}s, posture score {}",
            record.reps, record.exercise_type, record.duration, record.posture_score
        );
        Ok(record)
    }

    /// Single consumer: frames are processed strictly in queue order
    async fn process_frames(
        mut rx: mpsc::Receiver<PoseFrame>,
        counter: Arc<Mutex<RepCounter>>,
        events: broadcast::Sender<RepEvent>,
    ) {
        let mut pose_detected = false;

        while let Some(frame) = rx.recv().await {
            if !pose_detected && !frame.landmarks.is_empty() {
                pose_detected = true;
                info!("Pose detected");
                let _ = events.send(RepEvent::PoseDetected);
            }

            counter.lock().await.process(&frame.landmarks);
        }

        debug!("Frame queue closed");
    }
}
