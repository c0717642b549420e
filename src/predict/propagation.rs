use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::elements::OrbitalElementSet;
use crate::predict::error::PredictError;
use crate::predict::event_finder::find_events;
use crate::predict::observer::ObserverLocation;
use crate::predict::types::{RawEvent, Topocentric};

/// Orbit propagation as seen from a ground observer
pub trait Propagator {
    /// Time-ordered rise/culmination/set events relative to `min_elevation_deg`
    fn events(
        &self,
        observer: &ObserverLocation,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_elevation_deg: f64,
    ) -> Result<Vec<RawEvent>, PredictError>;

    fn topocentric(
        &self,
        observer: &ObserverLocation,
        time: DateTime<Utc>,
    ) -> Result<Topocentric, PredictError>;
}

pub struct Sgp4Propagator {
    elements: Elements,
    constants: Constants,
}

impl Sgp4Propagator {
    pub fn from_elements(set: &OrbitalElementSet) -> Result<Self, PredictError> {
        let unavailable = |e: String| PredictError::PropagatorUnavailable(format!("{}: {}", set.name, e));

        let elements = Elements::from_tle(
            Some(set.name.clone()),
            set.line1.as_bytes(),
            set.line2.as_bytes(),
        )
        .map_err(|e| unavailable(e.to_string()))?;
        let constants = Constants::from_elements(&elements).map_err(|e| unavailable(e.to_string()))?;

        Ok(Self {
            elements,
            constants,
        })
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }
}

impl Propagator for Sgp4Propagator {
    fn events(
        &self,
        observer: &ObserverLocation,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_elevation_deg: f64,
    ) -> Result<Vec<RawEvent>, PredictError> {
        find_events(
            |time| self.topocentric(observer, time).map(|t| t.elevation_deg),
            start,
            end,
            min_elevation_deg,
        )
    }

    fn topocentric(
        &self,
        observer: &ObserverLocation,
        time: DateTime<Utc>,
    ) -> Result<Topocentric, PredictError> {
        let naive = time.naive_utc();
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&naive)
            .map_err(|e| PredictError::Propagation(e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| PredictError::Propagation(e.to_string()))?;

        let sidereal = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&naive));
        let sat_ecef = teme_to_ecef_position(prediction.position, sidereal);

        Ok(look_angles(observer, sat_ecef))
    }
}

pub fn look_angles(observer: &ObserverLocation, sat_ecef_km: [f64; 3]) -> Topocentric {
    let sta = observer.position_ecef_km();
    let dr = [
        sat_ecef_km[0] - sta[0],
        sat_ecef_km[1] - sta[1],
        sat_ecef_km[2] - sta[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

    let (east, north, up) = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
    let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
    let elevation_deg = if range_km > 0.0 {
        (up / range_km).clamp(-1.0, 1.0).asin().to_degrees()
    } else {
        0.0
    };

    Topocentric {
        elevation_deg,
        azimuth_deg,
        range_km,
    }
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}
