use std::path::Path;

use chrono::{DateTime, Utc};

use crate::observations::error::ObservationError;
use crate::observations::types::{NewObservation, ObservationLogEntry};
use crate::predict::PassRecord;

/// Append-only observation log, persisted as CSV
#[derive(Debug, Clone, Default)]
pub struct ObservationLog {
    entries: Vec<ObservationLogEntry>,
}

impl ObservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ObservationLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate `observation` against `predictions` and append it
    pub fn append(
        &mut self,
        predictions: &[PassRecord],
        observation: NewObservation,
        observed_at: DateTime<Utc>,
    ) -> Result<&ObservationLogEntry, ObservationError> {
        if !predictions.iter().any(|p| p.pass_id == observation.pass_id) {
            return Err(ObservationError::UnknownPass(observation.pass_id));
        }
        if let Some(altitude) = observation.actual_altitude {
            if !(0.0..=90.0).contains(&altitude) {
                return Err(ObservationError::InvalidAltitude(altitude));
            }
        }

        self.entries.push(ObservationLogEntry {
            pass_id: observation.pass_id,
            observation_time: observed_at,
            weather: observation.weather,
            successful: observation.successful,
            notes: observation.notes,
            actual_altitude: observation.actual_altitude,
        });

        log::info!("Logged observation for pass {}", observation.pass_id);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Load a previously saved log; a missing file is an empty log
    pub fn load(path: &Path) -> Result<Self, ObservationError> {
        if !path.exists() {
            log::debug!("No observation log at {}", path.display());
            return Ok(Self::new());
        }

        let mut reader = csv::Reader::from_path(path)?;
        let entries = reader
            .deserialize()
            .collect::<Result<Vec<ObservationLogEntry>, _>>()?;

        log::debug!("Loaded {} observations from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    pub fn save(&self, path: &Path) -> Result<(), ObservationError> {
        let file = std::fs::File::create(path)?;
        crate::observations::export::write_observations(file, &self.entries)
    }
}
