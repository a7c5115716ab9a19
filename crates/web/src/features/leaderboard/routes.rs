use axum::{Router, routing::get};

use super::handlers::{export_leaderboard, get_leaderboard, get_participant_results, list_races};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_leaderboard))
        .route("/export", get(export_leaderboard))
        .route("/races", get(list_races))
}

pub fn participant_routes() -> Router<AppState> {
    Router::new().route("/:participant_id/results", get(get_participant_results))
}
