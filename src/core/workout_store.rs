// Workout history - append-only collection of finished workout records

use crate::core::database::Database;
use crate::models::workout::{
    WorkoutError, WorkoutRecord, WorkoutResult, WorkoutSummary, MAX_POSTURE_SCORE,
    MIN_POSTURE_SCORE,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Durable, ordered workout history
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Append a finished workout
    async fn save_workout(&self, workout: &WorkoutRecord) -> WorkoutResult<()>;

    /// All workouts in the order they were saved
    async fn get_workouts(&self) -> WorkoutResult<Vec<WorkoutRecord>>;

    /// Most recently saved workout
    async fn get_latest_workout(&self) -> WorkoutResult<Option<WorkoutRecord>>;

    /// Remove the whole history
    async fn clear_workouts(&self) -> WorkoutResult<()>;

    /// Totals for the dashboard
    async fn summary(&self) -> WorkoutResult<WorkoutSummary> {
        let workouts = self.get_workouts().await?;
        Ok(WorkoutSummary::from_records(&workouts))
    }
}

// ==============================================================================
// SQLite
// ==============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct WorkoutRow {
    id: String,
    exercise_type: String,
    reps: i64,
    duration_secs: i64,
    timestamp: i64,
    posture_score: i64,
    posture_notes_json: String,
}

impl TryFrom<WorkoutRow> for WorkoutRecord {
    type Error = WorkoutError;

    fn try_from(row: WorkoutRow) -> WorkoutResult<Self> {
        let corrupt = |field: &str, value: i64| {
            WorkoutError::CorruptRecord(format!("{} has invalid {} {}", row.id, field, value))
        };

        let reps = u32::try_from(row.reps).map_err(|_| corrupt("reps", row.reps))?;
        let duration =
            u64::try_from(row.duration_secs).map_err(|_| corrupt("duration", row.duration_secs))?;
        let posture_score = u32::try_from(row.posture_score)
            .ok()
            .filter(|score| (MIN_POSTURE_SCORE..=MAX_POSTURE_SCORE).contains(score))
            .ok_or_else(|| corrupt("posture score", row.posture_score))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(row.timestamp)
            .ok_or_else(|| corrupt("timestamp", row.timestamp))?;
        let posture_notes: Vec<String> = serde_json::from_str(&row.posture_notes_json)?;

        Ok(WorkoutRecord {
            id: row.id,
            exercise_type: row.exercise_type,
            reps,
            duration,
            timestamp,
            posture_score,
            posture_notes,
        })
    }
}

const SELECT_WORKOUT_COLUMNS: &str = "SELECT id, exercise_type, reps, duration_secs, timestamp, posture_score, posture_notes_json
     FROM workouts";

pub struct SqliteWorkoutStore {
    db: Arc<Database>,
}

impl SqliteWorkoutStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WorkoutStore for SqliteWorkoutStore {
    async fn save_workout(&self, workout: &WorkoutRecord) -> WorkoutResult<()> {
        let notes_json = serde_json::to_string(&workout.posture_notes)?;
        let duration_secs = i64::try_from(workout.duration).map_err(|_| {
            WorkoutError::CorruptRecord(format!("{} duration out of range", workout.id))
        })?;
        let created_at = Utc::now().timestamp_millis();

        sqlx::query(
            "INSERT INTO workouts (
                id, exercise_type, reps, duration_secs, timestamp,
                posture_score, posture_notes_json, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&workout.id)
        .bind(&workout.exercise_type)
        .bind(i64::from(workout.reps))
        .bind(duration_secs)
        .bind(workout.timestamp.timestamp_millis())
        .bind(i64::from(workout.posture_score))
        .bind(notes_json)
        .bind(created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn get_workouts(&self) -> WorkoutResult<Vec<WorkoutRecord>> {
        let rows = sqlx::query_as::<_, WorkoutRow>(&format!(
            "{} ORDER BY seq ASC",
            SELECT_WORKOUT_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(WorkoutRecord::try_from).collect()
    }

    async fn get_latest_workout(&self) -> WorkoutResult<Option<WorkoutRecord>> {
        let row = sqlx::query_as::<_, WorkoutRow>(&format!(
            "{} ORDER BY seq DESC LIMIT 1",
            SELECT_WORKOUT_COLUMNS
        ))
        .fetch_optional(self.db.pool())
        .await?;

        row.map(WorkoutRecord::try_from).transpose()
    }

    async fn clear_workouts(&self) -> WorkoutResult<()> {
        sqlx::query("DELETE FROM workouts")
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}

// ==============================================================================
// In-memory
// ==============================================================================

/// Non-persistent history, for previews and tests
#[derive(Default)]
pub struct InMemoryWorkoutStore {
    workouts: RwLock<Vec<WorkoutRecord>>,
}

impl InMemoryWorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkoutStore for InMemoryWorkoutStore {
    async fn save_workout(&self, workout: &WorkoutRecord) -> WorkoutResult<()> {
        self.workouts.write().await.push(workout.clone());
        Ok(())
    }

    async fn get_workouts(&self) -> WorkoutResult<Vec<WorkoutRecord>> {
        Ok(self.workouts.read().await.clone())
    }

    async fn get_latest_workout(&self) -> WorkoutResult<Option<WorkoutRecord>> {
        Ok(self.workouts.read().await.last().cloned())
    }

    async fn clear_workouts(&self) -> WorkoutResult<()> {
        self.workouts.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(exercise: &str, reps: u32, notes: &[&str]) -> WorkoutRecord {
        WorkoutRecord {
            id: uuid::Uuid::new_v4().to_string(),
            exercise_type: exercise.to_string(),
            reps,
            duration: 60,
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            posture_score: crate::models::workout::posture_score(notes.len()),
            posture_notes: notes.iter().map(|n| n.to_string()).collect(),
        }
    }

    async fn setup_sqlite_store() -> SqliteWorkoutStore {
        let db = Database::in_memory()
            .await
            .expect("Failed to create in-memory database");
        SqliteWorkoutStore::new(Arc::new(db))
    }

    async fn exercise_store(store: &dyn WorkoutStore) {
        assert!(store.get_workouts().await.unwrap().is_empty());
        assert!(store.get_latest_workout().await.unwrap().is_none());

        let first = record("squats", 10, &["Keep knees aligned with toes"]);
        let second = record("pushups", 7, &[]);
        let third = record("bicep_curls", 12, &[]);

        for workout in [&first, &second, &third] {
            store.save_workout(workout).await.expect("Failed to save workout");
        }

        let workouts = store.get_workouts().await.unwrap();
        assert_eq!(workouts, vec![first.clone(), second.clone(), third.clone()]);

        let latest = store.get_latest_workout().await.unwrap();
        assert_eq!(latest, Some(third.clone()));

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.total_workouts, 3);
        assert_eq!(summary.total_reps, 29);
        assert_eq!(summary.total_minutes, 3);
        // (95 + 100 + 100) / 3
        assert_eq!(summary.average_posture_score, 98);
        assert_eq!(summary.latest, Some(third));

        store.clear_workouts().await.unwrap();
        assert!(store.get_workouts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_store() {
        let store = setup_sqlite_store().await;
        exercise_store(&store).await;
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryWorkoutStore::new();
        exercise_store(&store).await;
    }

    #[tokio::test]
    async fn test_sqlite_rejects_duplicate_id() {
        let store = setup_sqlite_store().await;
        let workout = record("squats", 3, &[]);

        store.save_workout(&workout).await.unwrap();
        let err = store.save_workout(&workout).await.unwrap_err();
        assert!(matches!(err, WorkoutError::Database(_)));

        assert_eq!(store.get_workouts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_detects_corrupt_notes() {
        let store = setup_sqlite_store().await;

        sqlx::query(
            "INSERT INTO workouts (id, exercise_type, reps, duration_secs, timestamp, posture_score, posture_notes_json, created_at)
             VALUES ('bad', 'squats', 1, 1, 0, 100, 'not json', 0)",
        )
        .execute(store.db.pool())
        .await
        .unwrap();

        let err = store.get_latest_workout().await.unwrap_err();
        assert!(matches!(err, WorkoutError::Serialization(_)));
    }
}
