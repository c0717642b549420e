use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::elements::{ElementsFetcher, HttpTransport};
use crate::observations::{load_predictions, ObservationLog};

use super::api::export as export_handlers;
use super::api::observations as observation_handlers;
use super::api::predict as predict_handlers;
use super::api_doc::ApiDoc;
use super::state::{AppState, Session};

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();

    let transport = HttpTransport::new().map_err(std::io::Error::other)?;
    let fetcher = ElementsFetcher::new(transport, config.fetch.clone());

    // Resume the table and log of a previous session if they exist
    let predictions = load_predictions(&config.storage.predictions_csv).unwrap_or_else(|e| {
        log::warn!("Ignoring stored predictions: {}", e);
        Vec::new()
    });
    let log = ObservationLog::load(&config.storage.observations_csv).map_err(std::io::Error::other)?;

    let state = AppState {
        config: Arc::new(config),
        fetcher: Arc::new(fetcher),
        session: Arc::new(Mutex::new(Session { predictions, log })),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // Predict API endpoints
        .route("/api/predict", get(predict_handlers::list_predictions))
        // Observation API endpoints
        .route(
            "/api/observations",
            get(observation_handlers::list_observations).post(observation_handlers::log_observation),
        )
        .route("/api/summary", get(observation_handlers::summary))
        .route("/api/export/{kind}", get(export_handlers::export_csv))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
