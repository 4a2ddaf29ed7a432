pub mod config;
pub mod database;
pub mod workout_store;

// Rep counting
pub mod angle;
pub mod posture;
pub mod rep_counter;
pub mod workout_session;
