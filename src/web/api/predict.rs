use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::elements::OrbitalElementSet;
use crate::observations::save_predictions;
use crate::predict::{
    extract_passes, filter_by_altitude, BrightnessModel, ObserverLocation, PassRecord, PredictError,
    PredictionWindow, Sgp4Propagator,
};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PredictQuery {
    /// Days to predict, 1 to 14 (defaults to the configured window)
    #[serde(default)]
    pub days: Option<u32>,
    /// Minimum culmination elevation for a pass to be reported (degrees)
    #[serde(default)]
    pub min_elevation: Option<f64>,
    /// Display threshold for `visible` (degrees)
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PredictResponse {
    pub satellite: String,
    pub threshold_deg: f64,
    pub passes: Vec<PassRecord>,
    /// Subset of `passes` peaking at or above `threshold_deg`
    pub visible: Vec<PassRecord>,
}

#[utoipa::path(
    get,
    path = "/api/predict",
    tag = "predict",
    params(PredictQuery),
    responses(
        (status = 200, description = "Pass predictions (possibly empty)", body = PredictResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 502, description = "Catalog answered without a usable element set", body = ErrorResponse),
        (status = 503, description = "Catalog unreachable or propagator unavailable", body = ErrorResponse)
    )
)]
pub async fn list_predictions(
    State(state): State<AppState>,
    Query(query): Query<PredictQuery>,
) -> ApiResult<Json<PredictResponse>> {
    let config = &state.config;
    let window = PredictionWindow::new(
        Utc::now(),
        query.days.unwrap_or(config.prediction.days),
        query
            .min_elevation
            .unwrap_or(config.prediction.min_elevation_deg),
    )?;
    let threshold_deg = query.threshold.unwrap_or(config.prediction.threshold_deg);

    let elements = state.fetcher.fetch(&config.target).await?;
    let passes = extract_off_runtime(
        elements.clone(),
        config.observer,
        window,
        config.brightness,
    )
    .await?;
    let visible = filter_by_altitude(&passes, threshold_deg);

    // Observation ids refer to the latest table
    save_predictions(&config.storage.predictions_csv, &passes)?;
    state.session.lock().await.predictions = passes.clone();

    Ok(Json(PredictResponse {
        satellite: elements.name,
        threshold_deg,
        passes,
        visible,
    }))
}

/// SGP4 scanning is CPU-bound, so it runs on the blocking pool
async fn extract_off_runtime(
    elements: OrbitalElementSet,
    observer: ObserverLocation,
    window: PredictionWindow,
    brightness: BrightnessModel,
) -> Result<Vec<PassRecord>, PredictError> {
    tokio::task::spawn_blocking(move || {
        let propagator = Sgp4Propagator::from_elements(&elements)?;
        extract_passes(&propagator, &observer, &window, &brightness)
    })
    .await
    .map_err(|e| PredictError::Propagation(format!("extraction task failed: {}", e)))?
}
