pub mod core;
pub mod models;

pub use crate::core::config::Config;
pub use crate::core::database::Database;
pub use crate::core::rep_counter::{RepCounter, RepEvent, RepPhase, RepSnapshot};
pub use crate::core::workout_session::WorkoutSession;
pub use crate::core::workout_store::{InMemoryWorkoutStore, SqliteWorkoutStore, WorkoutStore};
pub use crate::models::pose::{BodyLandmark, Landmark, PoseFrame};
pub use crate::models::workout::{
    ExerciseDefinition, WorkoutError, WorkoutRecord, WorkoutResult, WorkoutSummary,
};

use log::{info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Initialize logging (RUST_LOG wins over `default_level`)
pub fn init_logging(default_level: &str) {
    let _ = env_logger::Builder::new()
        .parse_filters(default_level)
        .parse_default_env()
        .try_init();
}

/// Counts from a replayed frame stream
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub lines: usize,
    pub accepted: usize,
    pub malformed: usize,
}

/// Run one workout over JSON-lines `PoseFrame`s and return the stored record.
///
/// Blank lines are ignored; lines that fail to parse are logged and skipped.
pub async fn replay<R>(
    session: &WorkoutSession,
    exercise_id: &str,
    reader: R,
) -> WorkoutResult<(WorkoutRecord, ReplayStats)>
where
    R: AsyncBufRead + Unpin,
{
    session.start_workout(exercise_id).await?;

    let mut stats = ReplayStats::default();
    let mut lines = reader.lines();
    let read_result = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        stats.lines += 1;

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<PoseFrame>(&line) {
            Ok(frame) => {
                if session.submit_frame(frame).await {
                    stats.accepted += 1;
                }
            }
            Err(e) => {
                stats.malformed += 1;
                warn!("Skipping malformed frame on line {}: {}", stats.lines, e);
            }
        }
    };

    // Always close the workout, even when reading failed part way
    let record = session.stop_workout().await?;
    read_result?;

    info!(
        "Replayed {} lines ({} frames processed, {} malformed)",
        stats.lines, stats.accepted, stats.malformed
    );
    Ok((record, stats))
}
