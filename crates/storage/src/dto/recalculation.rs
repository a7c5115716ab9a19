use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{RaceId, ResultKind, ResultSelection};

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RecalculateRequest {
    /// Single race to recalculate; omitted means every race
    #[validate(range(min = 1, message = "race_id must be a positive id"))]
    pub race_id: Option<RaceId>,
    #[serde(rename = "type", default)]
    pub selection: ResultSelection,
    /// Recompute rows that already hold points
    #[serde(default)]
    pub force: bool,
}

/// Outcome of recalculating one `(race, kind)` scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RaceRecalculation {
    pub race_id: RaceId,
    pub race_name: String,
    pub kind: ResultKind,
    /// Rows ranked in the scope
    pub total: u64,
    /// Rows the pass recomputed and persisted
    pub written: u64,
    /// Persisted rows whose stored value actually changed
    pub updated: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecalculationReport {
    pub races: Vec<RaceRecalculation>,
    pub total: u64,
    pub written: u64,
    pub updated: u64,
}

impl RecalculationReport {
    pub fn push(&mut self, outcome: RaceRecalculation) {
        self.total += outcome.total;
        self.written += outcome.written;
        self.updated += outcome.updated;
        self.races.push(outcome);
    }

    pub fn for_race(&self, race_id: RaceId, kind: ResultKind) -> Option<&RaceRecalculation> {
        self.races
            .iter()
            .find(|outcome| outcome.race_id == race_id && outcome.kind == kind)
    }
}
