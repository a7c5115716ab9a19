use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use storage::dto::recalculation::{RecalculateRequest, RecalculationReport};
use validator::Validate;

use crate::{error::WebError, state::AppState};

use super::services;

#[utoipa::path(
    post,
    path = "/api/admin/recalculate",
    request_body = RecalculateRequest,
    responses(
        (status = 200, description = "Points recalculated", body = RecalculationReport),
        (status = 400, description = "Invalid input or unknown race"),
        (status = 409, description = "Another recalculation holds the scope, retry later")
    ),
    tag = "admin"
)]
pub async fn recalculate_points(
    State(state): State<AppState>,
    Json(request): Json<RecalculateRequest>,
) -> Result<Response, WebError> {
    request.validate()?;

    tracing::info!(
        "Recalculation requested for race {:?}, selection {:?}, force {}",
        request.race_id,
        request.selection,
        request.force
    );

    let report = services::recalculate(&state, &request).await?;

    Ok(Json(report).into_response())
}
