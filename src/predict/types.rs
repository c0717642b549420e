use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::error::PredictError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Rise,
    Culmination,
    Set,
}

/// One entry of the propagator's time-ordered event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub time: DateTime<Utc>,
    pub kind: EventKind,
}

impl RawEvent {
    pub fn new(time: DateTime<Utc>, kind: EventKind) -> Self {
        Self { time, kind }
    }
}

/// Look angles and slant range from the observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Topocentric {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
}

/// Longest prediction window, in days
pub const MAX_WINDOW_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionWindow {
    pub start: DateTime<Utc>,
    pub days: u32,
    pub min_elevation_deg: f64,
}

impl PredictionWindow {
    pub fn new(start: DateTime<Utc>, days: u32, min_elevation_deg: f64) -> Result<Self, PredictError> {
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(PredictError::InvalidWindow(format!(
                "window of {} days outside [1, {}]",
                days, MAX_WINDOW_DAYS
            )));
        }
        if !(0.0..=90.0).contains(&min_elevation_deg) {
            return Err(PredictError::InvalidWindow(format!(
                "minimum elevation {} outside [0, 90]",
                min_elevation_deg
            )));
        }
        let window = Self {
            start,
            days,
            min_elevation_deg,
        };
        window.checked_end()?;
        Ok(window)
    }

    fn checked_end(&self) -> Result<DateTime<Utc>, PredictError> {
        Duration::try_days(i64::from(self.days))
            .and_then(|span| self.start.checked_add_signed(span))
            .ok_or_else(|| {
                PredictError::InvalidWindow(format!("{} + {} days is out of range", self.start, self.days))
            })
    }

    /// Checked at construction; saturates for hand-built windows
    pub fn end(&self) -> DateTime<Utc> {
        self.checked_end().unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// A predicted, fully characterised pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PassRecord {
    /// Dense 1-based id, only meaningful within one prediction run
    pub pass_id: u32,
    pub rise_time: DateTime<Utc>,
    pub culmination_time: DateTime<Utc>,
    pub set_time: DateTime<Utc>,
    pub max_altitude: f64,
    pub rise_azimuth: f64,
    pub set_azimuth: f64,
    pub duration_minutes: f64,
    /// Lower is brighter
    pub brightness: f64,
}
