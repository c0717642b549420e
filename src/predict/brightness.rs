use serde::Deserialize;
use utoipa::ToSchema;

use crate::predict::error::PredictError;

/// Range-only brightness proxy: `offset - reference_km / range_km`.
///
/// Not a photometric magnitude. Phase angle and solar illumination are
/// ignored, so the figure only orders passes by how close they come.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema)]
#[serde(default)]
pub struct BrightnessModel {
    pub offset: f64,
    pub reference_km: f64,
}

impl Default for BrightnessModel {
    fn default() -> Self {
        Self {
            offset: 0.0,
            reference_km: 400.0,
        }
    }
}

impl BrightnessModel {
    pub fn validate(&self) -> Result<(), PredictError> {
        if !self.reference_km.is_finite() || self.reference_km <= 0.0 || !self.offset.is_finite() {
            return Err(PredictError::InvalidCalibration(format!(
                "brightness calibration needs a positive reference distance, got {}",
                self.reference_km
            )));
        }
        Ok(())
    }

    pub fn estimate(&self, range_km: f64) -> Result<f64, PredictError> {
        if range_km.is_nan() || range_km <= 0.0 {
            return Err(PredictError::Propagation(format!(
                "non-positive slant range {} km",
                range_km
            )));
        }
        Ok(self.offset - self.reference_km / range_km)
    }
}
