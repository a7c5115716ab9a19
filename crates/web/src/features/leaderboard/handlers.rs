use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use storage::{
    dto::leaderboard::{ExportFilter, Leaderboard, LeaderboardFilter},
    models::{ParticipantId, Race},
};

use crate::{error::WebError, state::AppState};

use super::services;

#[utoipa::path(
    get,
    path = "/api/leaderboard",
    params(LeaderboardFilter),
    responses(
        (status = 200, description = "Leaderboard retrieved successfully", body = Leaderboard),
        (status = 400, description = "Invalid query parameters or unknown race")
    ),
    tag = "leaderboard"
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(filter): Query<LeaderboardFilter>,
) -> Result<Response, WebError> {
    filter.validate().map_err(WebError::BadRequest)?;

    let leaderboard = services::public_leaderboard(&state, &filter).await?;

    Ok(Json(leaderboard).into_response())
}

#[utoipa::path(
    get,
    path = "/api/participants/{participant_id}/results",
    params(
        ("participant_id" = i64, Path, description = "Participant whose results are listed"),
        LeaderboardFilter
    ),
    responses(
        (status = 200, description = "Participant results retrieved successfully", body = Leaderboard),
        (status = 400, description = "Invalid query parameters or unknown race")
    ),
    tag = "leaderboard"
)]
pub async fn get_participant_results(
    State(state): State<AppState>,
    Path(participant_id): Path<ParticipantId>,
    Query(filter): Query<LeaderboardFilter>,
) -> Result<Response, WebError> {
    filter.validate().map_err(WebError::BadRequest)?;

    let leaderboard = services::participant_results(&state, participant_id, &filter).await?;

    Ok(Json(leaderboard).into_response())
}

#[utoipa::path(
    get,
    path = "/api/leaderboard/races",
    responses(
        (status = 200, description = "Races retrieved successfully", body = Vec<Race>)
    ),
    tag = "leaderboard"
)]
pub async fn list_races(State(state): State<AppState>) -> Result<Response, WebError> {
    let races = services::list_races(&state).await?;
    Ok(Json(races).into_response())
}

#[utoipa::path(
    get,
    path = "/api/leaderboard/export",
    params(ExportFilter),
    responses(
        (status = 200, description = "Public leaderboard as CSV", body = String, content_type = "text/csv"),
        (status = 400, description = "Unknown race")
    ),
    tag = "leaderboard"
)]
pub async fn export_leaderboard(
    State(state): State<AppState>,
    Query(filter): Query<ExportFilter>,
) -> Result<Response, WebError> {
    if filter.race_id.is_some_and(|id| id < 1) {
        return Err(WebError::BadRequest("race_id must be positive".to_string()));
    }

    let (csv, filename) = services::export_csv(&state, filter.race_id, filter.kind).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}
