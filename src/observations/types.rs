use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum Weather {
    Clear,
    #[serde(rename = "Partly Cloudy")]
    #[strum(to_string = "Partly Cloudy", serialize = "partly-cloudy", serialize = "partly_cloudy")]
    PartlyCloudy,
    Cloudy,
    Overcast,
    Rainy,
}

/// One observer report, referencing a pass of the current predictions table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ObservationLogEntry {
    pub pass_id: u32,
    pub observation_time: DateTime<Utc>,
    pub weather: Weather,
    pub successful: bool,
    #[serde(default)]
    pub notes: String,
    /// Peak altitude the observer actually saw, in degrees
    pub actual_altitude: Option<f64>,
}

/// Observer input before it is timestamped and appended
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewObservation {
    pub pass_id: u32,
    pub weather: Weather,
    #[serde(default = "default_successful")]
    pub successful: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub actual_altitude: Option<f64>,
}

fn default_successful() -> bool {
    true
}
