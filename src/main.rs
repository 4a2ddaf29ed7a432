use repsense_lib::{
    init_logging, replay, Config, Database, ExerciseDefinition, SqliteWorkoutStore, WorkoutSession,
    WorkoutError, WorkoutStore,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;

const USAGE: &str = "Usage: repsense <exercise_id> <frames.jsonl>\n       repsense --list";

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            log::warn!("Failed to load configuration, using defaults: {}", e);
            Config::default()
        }
    };
    init_logging(&config.log_level);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.as_slice() {
        [flag] if flag == "--list" => list_exercises(),
        [exercise_id, frames_path] => run_replay(&config, exercise_id, frames_path).await,
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn list_exercises() -> Result<(), Box<dyn std::error::Error>> {
    for exercise in ExerciseDefinition::all() {
        println!("{:<12} {} - {}", exercise.id, exercise.name, exercise.description);
        println!("{:<12} {}", "", exercise.standing_guide);
    }
    Ok(())
}

async fn run_replay(
    config: &Config,
    exercise_id: &str,
    frames_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::init(&config.database_path()).await?;
    let store = Arc::new(SqliteWorkoutStore::new(Arc::new(db)));
    let session = WorkoutSession::new(store.clone(), config);

    let file = tokio::fs::File::open(frames_path).await?;
    let record = match replay(&session, exercise_id, BufReader::new(file)).await {
        Ok((record, _)) => record,
        Err(WorkoutError::SaveFailed { record, source }) => {
            // Still show the finished workout so it is not lost
            println!("{}", serde_json::to_string_pretty(&record)?);
            return Err((*source).into());
        }
        Err(e) => return Err(e.into()),
    };
    let summary = store.summary().await?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
