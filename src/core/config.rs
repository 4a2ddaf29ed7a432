use crate::models::workout::ExerciseDefinition;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DATA_DIR_NAME: &str = ".repsense_data";
const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Where the workout database lives
    pub storage_path: PathBuf,
    /// Maximum landmark frames processed per second
    pub target_fps: u32,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
    /// Exercise used when none is given
    pub default_exercise: String,
}

impl Default for Config {
    fn default() -> Self {
        let mut storage_path = Self::home_dir().unwrap_or_else(|| PathBuf::from("."));
        storage_path.push(DATA_DIR_NAME);
        storage_path.push("database");

        Self {
            storage_path,
            target_fps: 15,
            log_level: "info".to_string(),
            default_exercise: "squats".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating with defaults if it doesn't exist
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        self.validate()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.target_fps == 0 || self.target_fps > 60 {
            return Err(format!(
                "Invalid target FPS: {}. Must be between 1 and 60",
                self.target_fps
            )
            .into());
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )
            .into());
        }

        if ExerciseDefinition::lookup(&self.default_exercise).is_none() {
            let known: Vec<&str> = ExerciseDefinition::all().iter().map(|e| e.id).collect();
            return Err(format!(
                "Invalid default exercise: {}. Must be one of: {}",
                self.default_exercise,
                known.join(", ")
            )
            .into());
        }

        if self.storage_path.as_os_str().is_empty() {
            return Err("Storage path cannot be empty".into());
        }

        Ok(())
    }

    /// Reset to default configuration
    pub fn reset() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self::default();
        config.save()?;
        Ok(config)
    }

    /// SQLite file holding the workout history
    pub fn database_path(&self) -> PathBuf {
        self.storage_path.join("workouts.db")
    }

    /// Get the configuration file path
    fn get_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let mut path = Self::home_dir().ok_or("Could not determine home directory")?;
        path.push(DATA_DIR_NAME);
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }

    fn home_dir() -> Option<PathBuf> {
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn get_test_config_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("repsense_test_config_{}_{}", name, std::process::id()));
        path.push("settings.json");
        path
    }

    fn cleanup_test_config(path: &PathBuf) {
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.target_fps, 15);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.default_exercise, "squats");
        assert!(config.storage_path.ends_with(".repsense_data/database"));
        assert!(config.database_path().ends_with("workouts.db"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        assert!(config.validate().is_ok());

        config.target_fps = 0;
        assert!(config.validate().is_err());
        config.target_fps = 61;
        assert!(config.validate().is_err());
        config.target_fps = 15;

        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());
        config.log_level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
        config.log_level = "info".to_string();

        config.default_exercise = "burpees".to_string();
        assert!(config.validate().is_err());
        config.default_exercise = "bicep_curls".to_string();
        assert!(config.validate().is_ok());

        config.storage_path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_load_creates_defaults_then_round_trips() {
        let path = get_test_config_path("load");
        cleanup_test_config(&path);

        let created = Config::load_from(&path).unwrap();
        assert_eq!(created, Config::default());
        assert!(path.exists());

        let mut changed = created.clone();
        changed.target_fps = 30;
        changed.default_exercise = "pushups".to_string();
        changed.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, changed);

        cleanup_test_config(&path);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = get_test_config_path("invalid");
        cleanup_test_config(&path);

        let mut config = Config::default();
        config.target_fps = 0;
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        assert!(Config::load_from(&path).is_err());
        assert!(config.save_to(&path).is_err());

        cleanup_test_config(&path);
    }
}
