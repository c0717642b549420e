use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::observations::{export, ExportKind};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/export/{kind}",
    tag = "export",
    params(
        ("kind" = ExportKind, Path, description = "predictions, observations or joined")
    ),
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv", body = String),
        (status = 500, description = "Export failed", body = ErrorResponse)
    )
)]
pub async fn export_csv(
    State(state): State<AppState>,
    Path(kind): Path<ExportKind>,
) -> ApiResult<impl IntoResponse> {
    let session = state.session.lock().await;
    let mut body = Vec::new();
    export(kind, &mut body, &session.predictions, session.log.entries())?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.file_name()),
            ),
        ],
        body,
    ))
}
