use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::observations::error::ObservationError;
use crate::observations::types::{ObservationLogEntry, Weather};
use crate::predict::PassRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Predictions,
    Observations,
    Joined,
}

impl ExportKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportKind::Predictions => "iss_predictions.csv",
            ExportKind::Observations => "iss_observations.csv",
            ExportKind::Joined => "iss_full_data.csv",
        }
    }
}

/// A prediction row left-joined with at most one of its observations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRow {
    pub pass_id: u32,
    pub rise_time: DateTime<Utc>,
    pub culmination_time: DateTime<Utc>,
    pub set_time: DateTime<Utc>,
    pub max_altitude: f64,
    pub rise_azimuth: f64,
    pub set_azimuth: f64,
    pub duration_minutes: f64,
    pub brightness: f64,
    pub observation_time: Option<DateTime<Utc>>,
    pub weather: Option<Weather>,
    pub successful: Option<bool>,
    pub notes: Option<String>,
    pub actual_altitude: Option<f64>,
}

impl JoinedRow {
    fn new(pass: &PassRecord, observation: Option<&ObservationLogEntry>) -> Self {
        Self {
            pass_id: pass.pass_id,
            rise_time: pass.rise_time,
            culmination_time: pass.culmination_time,
            set_time: pass.set_time,
            max_altitude: pass.max_altitude,
            rise_azimuth: pass.rise_azimuth,
            set_azimuth: pass.set_azimuth,
            duration_minutes: pass.duration_minutes,
            brightness: pass.brightness,
            observation_time: observation.map(|o| o.observation_time),
            weather: observation.map(|o| o.weather),
            successful: observation.map(|o| o.successful),
            notes: observation.map(|o| o.notes.clone()),
            actual_altitude: observation.and_then(|o| o.actual_altitude),
        }
    }

    pub fn has_observation(&self) -> bool {
        self.successful.is_some()
    }
}

/// Left join on `pass_id`: every prediction appears, once per matching observation
pub fn join(predictions: &[PassRecord], observations: &[ObservationLogEntry]) -> Vec<JoinedRow> {
    predictions
        .iter()
        .flat_map(|pass| {
            let matching: Vec<_> = observations
                .iter()
                .filter(|o| o.pass_id == pass.pass_id)
                .collect();
            if matching.is_empty() {
                vec![JoinedRow::new(pass, None)]
            } else {
                matching
                    .into_iter()
                    .map(|o| JoinedRow::new(pass, Some(o)))
                    .collect()
            }
        })
        .collect()
}

pub fn write_predictions<W: Write>(writer: W, passes: &[PassRecord]) -> Result<(), ObservationError> {
    write_rows(writer, passes)
}

pub fn write_observations<W: Write>(
    writer: W,
    entries: &[ObservationLogEntry],
) -> Result<(), ObservationError> {
    write_rows(writer, entries)
}

pub fn write_joined<W: Write>(
    writer: W,
    predictions: &[PassRecord],
    observations: &[ObservationLogEntry],
) -> Result<(), ObservationError> {
    write_rows(writer, &join(predictions, observations))
}

pub fn export<W: Write>(
    kind: ExportKind,
    writer: W,
    predictions: &[PassRecord],
    observations: &[ObservationLogEntry],
) -> Result<(), ObservationError> {
    match kind {
        ExportKind::Predictions => write_predictions(writer, predictions),
        ExportKind::Observations => write_observations(writer, observations),
        ExportKind::Joined => write_joined(writer, predictions, observations),
    }
}

pub fn read_predictions<R: Read>(reader: R) -> Result<Vec<PassRecord>, ObservationError> {
    let mut reader = csv::Reader::from_reader(reader);
    let passes = reader.deserialize().collect::<Result<Vec<PassRecord>, _>>()?;
    Ok(passes)
}

pub fn save_predictions(path: &Path, passes: &[PassRecord]) -> Result<(), ObservationError> {
    write_predictions(File::create(path)?, passes)?;
    log::debug!("Saved {} predictions to {}", passes.len(), path.display());
    Ok(())
}

/// Predictions table from a previous run; a missing file is an empty table
pub fn load_predictions(path: &Path) -> Result<Vec<PassRecord>, ObservationError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_predictions(File::open(path)?)
}

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), ObservationError> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn pass(id: u32) -> PassRecord {
        let rise = Utc.with_ymd_and_hms(2025, 6, 1, 2, 0, 0).unwrap() + Duration::hours(i64::from(id));
        PassRecord {
            pass_id: id,
            rise_time: rise,
            culmination_time: rise + Duration::minutes(3),
            set_time: rise + Duration::minutes(6),
            max_altitude: 20.0 * f64::from(id),
            rise_azimuth: 300.5,
            set_azimuth: 120.25,
            duration_minutes: 6.0,
            brightness: -0.65,
        }
    }

    fn entry(pass_id: u32, successful: bool) -> ObservationLogEntry {
        ObservationLogEntry {
            pass_id,
            observation_time: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
            weather: Weather::Clear,
            successful,
            notes: "steady, no flare".into(),
            actual_altitude: None,
        }
    }

    #[test]
    fn join_keeps_unobserved_predictions() {
        let rows = join(&[pass(1), pass(2), pass(3)], &[entry(2, true), entry(2, false)]);

        let ids: Vec<_> = rows.iter().map(|r| r.pass_id).collect();
        assert_eq!(ids, vec![1, 2, 2, 3]);
        assert!(!rows[0].has_observation());
        assert_eq!(rows[1].successful, Some(true));
        assert_eq!(rows[2].successful, Some(false));
        assert!(rows[3].weather.is_none());
    }

    #[test]
    fn join_ignores_observations_for_unknown_passes() {
        let rows = join(&[pass(1)], &[entry(9, true)]);
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].has_observation());
    }

    #[test]
    fn predictions_csv_reads_back() {
        let mut buffer = Vec::new();
        write_predictions(&mut buffer, &[pass(1), pass(2)]).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("pass_id,rise_time,culmination_time,set_time,max_altitude"));

        let passes = read_predictions(buffer.as_slice()).unwrap();
        assert_eq!(passes, vec![pass(1), pass(2)]);
    }

    #[test]
    fn missing_predictions_file_is_empty_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let passes = load_predictions(&dir.path().join("none.csv")).unwrap();
        assert!(passes.is_empty());
    }

    #[test]
    fn saved_predictions_load_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("predictions.csv");
        save_predictions(&path, &[pass(3)]).unwrap();
        assert_eq!(load_predictions(&path).unwrap(), vec![pass(3)]);
    }

    #[test]
    fn joined_csv_leaves_missing_observation_columns_empty() {
        let mut buffer = Vec::new();
        write_joined(&mut buffer, &[pass(1)], &[]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.ends_with(",,,,,"));
    }
}
