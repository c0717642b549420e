use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::observations::{summarize, NewObservation, ObservationLogEntry, Summary};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/observations",
    tag = "observations",
    responses(
        (status = 200, description = "Logged observations", body = Vec<ObservationLogEntry>)
    )
)]
pub async fn list_observations(State(state): State<AppState>) -> Json<Vec<ObservationLogEntry>> {
    let session = state.session.lock().await;
    Json(session.log.entries().to_vec())
}

#[utoipa::path(
    post,
    path = "/api/observations",
    tag = "observations",
    request_body = NewObservation,
    responses(
        (status = 201, description = "Observation logged", body = ObservationLogEntry),
        (status = 400, description = "Invalid observation", body = ErrorResponse),
        (status = 404, description = "Pass not in the current predictions table", body = ErrorResponse)
    )
)]
pub async fn log_observation(
    State(state): State<AppState>,
    Json(observation): Json<NewObservation>,
) -> ApiResult<(StatusCode, Json<ObservationLogEntry>)> {
    let mut session = state.session.lock().await;
    let session = &mut *session;

    let entry = session
        .log
        .append(&session.predictions, observation, Utc::now())?
        .clone();
    session.log.save(&state.config.storage.observations_csv)?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/summary",
    tag = "observations",
    responses(
        (status = 200, description = "Observation success statistics", body = Summary)
    )
)]
pub async fn summary(State(state): State<AppState>) -> Json<Summary> {
    let session = state.session.lock().await;
    Json(summarize(&session.predictions, session.log.entries()))
}
