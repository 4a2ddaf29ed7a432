// Data models for pose landmarks, the exercise catalog and workout history

pub mod pose;
pub mod workout;
