use std::sync::Arc;

use storage::repository::{ProfileDirectory, ResultStore};
use storage::services::{
    CsvExporter, LeaderboardQuery, PointsFormula, PointsRecalculator, RankingEngine,
    RecalculationConfig,
};

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub leaderboard: LeaderboardQuery,
    pub exporter: CsvExporter,
    pub recalculator: PointsRecalculator,
}

impl AppState {
    pub fn new(
        results: Arc<dyn ResultStore>,
        profiles: Arc<dyn ProfileDirectory>,
        formula: Arc<dyn PointsFormula>,
        recalculation: RecalculationConfig,
    ) -> Self {
        let engine = RankingEngine::new(results, profiles);

        Self {
            leaderboard: LeaderboardQuery::new(engine.clone()),
            exporter: CsvExporter::new(engine.clone()),
            recalculator: PointsRecalculator::new(engine, formula).with_config(recalculation),
        }
    }
}
