pub mod csv_export;
pub mod leaderboard;
pub mod points;
pub mod ranking;
pub mod recalculation;

pub use csv_export::CsvExporter;
pub use leaderboard::LeaderboardQuery;
pub use points::{FieldSizePoints, FormulaChoice, LinearPoints, PointsFormula};
pub use ranking::{RankingEngine, RankingQuery, Visibility};
pub use recalculation::{PointsRecalculator, RecalculationConfig};

use crate::error::{Result, StorageError};
use crate::models::RaceId;
use crate::repository::ResultStore;

/// Rejects a race id that does not exist. `None` (every race) always passes.
pub(crate) async fn ensure_race(results: &dyn ResultStore, race_id: Option<RaceId>) -> Result<()> {
    if let Some(race_id) = race_id
        && results.race(race_id).await?.is_none()
    {
        return Err(StorageError::unknown_race(race_id));
    }

    Ok(())
}
