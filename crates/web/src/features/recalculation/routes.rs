use axum::{Router, routing::post};

use super::handlers::recalculate_points;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/recalculate", post(recalculate_points))
}
