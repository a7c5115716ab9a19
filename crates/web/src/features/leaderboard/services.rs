use storage::{
    dto::leaderboard::{Leaderboard, LeaderboardFilter},
    error::Result,
    models::{ParticipantId, Race, RaceId, ResultKind},
    services::csv_export::export_filename,
};

use crate::state::AppState;

/// Public leaderboard with filtering and pagination
pub async fn public_leaderboard(state: &AppState, filter: &LeaderboardFilter) -> Result<Leaderboard> {
    state.leaderboard.public_leaderboard(filter).await
}

/// Results of one participant, private profile included
pub async fn participant_results(
    state: &AppState,
    participant_id: ParticipantId,
    filter: &LeaderboardFilter,
) -> Result<Leaderboard> {
    state.leaderboard.my_results(participant_id, filter).await
}

pub async fn list_races(state: &AppState) -> Result<Vec<Race>> {
    state.leaderboard.races().await
}

/// CSV body and the attachment filename to send it under
pub async fn export_csv(
    state: &AppState,
    race_id: Option<RaceId>,
    kind: ResultKind,
) -> Result<(String, String)> {
    let csv = state.exporter.export(race_id, kind).await?;
    Ok((csv, export_filename(race_id, kind)))
}
