use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use crate::observations::ExportKind;
use super::api::predict::{PredictQuery, PredictResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::predict::list_predictions,
        super::api::observations::list_observations,
        super::api::observations::log_observation,
        super::api::observations::summary,
        super::api::export::export_csv,
    ),
    components(
        schemas(
            PredictQuery,
            PredictResponse,
            ErrorResponse,
            ExportKind,
            crate::predict::PassRecord,
            crate::observations::Weather,
            crate::observations::ObservationLogEntry,
            crate::observations::NewObservation,
            crate::observations::Summary,
            crate::observations::WeatherStats,
            crate::observations::DailyPasses,
        )
    ),
    info(
        title = "Pass-O-Mat API",
        description = "Pass predictions and observation logging for a single tracked object",
        version = "0.1.0"
    ),
    tags(
        (name = "predict", description = "Pass prediction"),
        (name = "observations", description = "Observation log and statistics"),
        (name = "export", description = "CSV exports")
    )
)]
pub struct ApiDoc;
