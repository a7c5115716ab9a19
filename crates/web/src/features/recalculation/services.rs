use storage::{
    dto::recalculation::{RecalculateRequest, RecalculationReport},
    error::Result,
};

use crate::state::AppState;

/// Recompute stored points for the requested scope
pub async fn recalculate(state: &AppState, request: &RecalculateRequest) -> Result<RecalculationReport> {
    state
        .recalculator
        .recalculate(request.race_id, request.selection, request.force)
        .await
}
