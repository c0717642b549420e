use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::elements::{FetchConfig, ObjectId};
use crate::predict::{BrightnessModel, ObserverLocation, MAX_WINDOW_DAYS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub observer: ObserverLocation,
    pub target: ObjectId,
    pub prediction: PredictionConfig,
    pub fetch: FetchConfig,
    pub brightness: BrightnessModel,
    pub storage: StorageConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub days: u32,
    pub min_elevation_deg: f64,
    /// Display filter applied after extraction
    pub threshold_deg: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            days: 7,
            min_elevation_deg: 10.0,
            threshold_deg: 30.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub predictions_csv: PathBuf,
    pub observations_csv: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            predictions_csv: PathBuf::from("iss_predictions.csv"),
            observations_csv: PathBuf::from("iss_observations.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when no file is given
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |e: &dyn std::fmt::Display| ConfigError::Invalid(e.to_string());

        self.observer.validate().map_err(|e| invalid(&e))?;
        self.brightness.validate().map_err(|e| invalid(&e))?;

        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Invalid("fetch.max_attempts must be at least 1".into()));
        }
        if self.fetch.timeout.is_zero() {
            return Err(ConfigError::Invalid("fetch.timeout must be positive".into()));
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.prediction.days) {
            return Err(ConfigError::Invalid(format!(
                "prediction.days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        if !(0.0..=90.0).contains(&self.prediction.min_elevation_deg) {
            return Err(ConfigError::Invalid(format!(
                "prediction.min_elevation_deg {} outside [0, 90]",
                self.prediction.min_elevation_deg
            )));
        }
        Ok(())
    }
}

/// humantime durations such as `"1s"` or `"1h 30m"`
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}
