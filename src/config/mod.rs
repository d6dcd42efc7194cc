use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::errors::WelloError;
use crate::questionnaire::{
    record::ActivityFloor,
    step::{StepSettings, MAX_AGE, MIN_AGE},
    FlowSequencer, TerminalStrategy,
};
use crate::utils::{paths, persistence};

pub const DEFAULT_ENDPOINT: &str = "https://wello-backend.onrender.com/main";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub nutrition_endpoint: String,
    pub terminal: TerminalStrategy,
    pub activity_floor: ActivityFloor,
    pub default_age: u8,
    pub export_records: bool,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nutrition_endpoint: DEFAULT_ENDPOINT.into(),
            terminal: TerminalStrategy::default(),
            activity_floor: ActivityFloor::default(),
            default_age: crate::questionnaire::step::DEFAULT_AGE,
            export_records: true,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    pub const KEYS: [&'static str; 6] = [
        "nutrition_endpoint",
        "terminal",
        "activity_floor",
        "default_age",
        "export_records",
        "request_timeout_secs",
    ];

    pub fn step_settings(&self) -> StepSettings {
        StepSettings {
            activity_floor: self.activity_floor,
            default_age: self.default_age,
        }
    }

    pub fn sequencer(&self) -> FlowSequencer {
        FlowSequencer::new(self.terminal, self.step_settings())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Updates one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), WelloError> {
        let value = value.trim();
        match key {
            "nutrition_endpoint" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(WelloError::Config(format!(
                        "endpoint must be an http(s) URL, got `{}`",
                        value
                    )));
                }
                self.nutrition_endpoint = value.to_string();
            }
            "terminal" => self.terminal = value.parse().map_err(WelloError::Config)?,
            "activity_floor" => self.activity_floor = value.parse().map_err(WelloError::Config)?,
            "default_age" => {
                let age = value
                    .parse::<u8>()
                    .ok()
                    .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
                    .ok_or_else(|| {
                        WelloError::Config(format!(
                            "default_age must be between {} and {}",
                            MIN_AGE, MAX_AGE
                        ))
                    })?;
                self.default_age = age;
            }
            "export_records" => {
                self.export_records = match value.to_ascii_lowercase().as_str() {
                    "y" | "yes" | "true" | "1" | "on" => true,
                    "n" | "no" | "false" | "0" | "off" => false,
                    _ => {
                        return Err(WelloError::Config(
                            "export_records expects yes/no".into(),
                        ))
                    }
                }
            }
            "request_timeout_secs" => {
                self.request_timeout_secs = value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| {
                        WelloError::Config("request_timeout_secs must be a positive number".into())
                    })?;
            }
            other => {
                return Err(WelloError::Config(format!(
                    "unknown setting `{}` (expected one of: {})",
                    other,
                    Self::KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
    base: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, WelloError> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, WelloError> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: paths::config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> Result<Config, WelloError> {
        if self.path.exists() {
            persistence::load_json(&self.path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), WelloError> {
        persistence::save_json_atomic(config, &self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory receiving exported onboarding records.
    pub fn records_dir(&self) -> PathBuf {
        paths::records_dir_in(&self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.terminal, TerminalStrategy::Completion);
    }

    #[test]
    fn save_and_reload() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let mut config = Config::default();
        config.set("terminal", "health-conditions").unwrap();
        config.set("activity_floor", "over30").unwrap();
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.terminal, TerminalStrategy::HealthConditions);
        assert_eq!(loaded.activity_floor, ActivityFloor::Over30);
        assert_eq!(loaded.sequencer().steps().len(), 6);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{"default_age": 50}"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.default_age, 50);
        assert_eq!(config.nutrition_endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(config.set("default_age", "0").is_err());
        assert!(config.set("default_age", "100").is_err());
        assert!(config.set("terminal", "home").is_err());
        assert!(config.set("nutrition_endpoint", "ftp://x").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert_eq!(config, Config::default());
    }
}
