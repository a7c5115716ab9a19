use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ParticipantId, Points, RaceId, ResultId, TeamId};

/// Which leaderboard a result belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    #[default]
    Individual,
    Team,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Team => "team",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result kinds targeted by a recalculation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResultSelection {
    Individual,
    Team,
    #[default]
    All,
}

impl ResultSelection {
    pub fn kinds(&self) -> &'static [ResultKind] {
        match self {
            Self::Individual => &[ResultKind::Individual],
            Self::Team => &[ResultKind::Team],
            Self::All => &[ResultKind::Individual, ResultKind::Team],
        }
    }
}

impl From<ResultKind> for ResultSelection {
    fn from(kind: ResultKind) -> Self {
        match kind {
            ResultKind::Individual => Self::Individual,
            ResultKind::Team => Self::Team,
        }
    }
}

/// One participant's result in one race. Times are whole seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceResult {
    pub result_id: ResultId,
    pub participant_id: ParticipantId,
    pub race_id: RaceId,
    pub time: i64,
    pub malus: i64,
    pub points: Points,
}

impl RaceResult {
    pub fn total_time(&self) -> i64 {
        self.time + self.malus
    }
}

/// A team's aggregated result in one race, averaged over its members.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamResult {
    pub result_id: ResultId,
    pub team_id: TeamId,
    pub race_id: RaceId,
    pub average_time: Decimal,
    pub average_malus: Decimal,
    pub member_count: i32,
    pub points: Points,
}

impl TeamResult {
    pub fn average_total_time(&self) -> Decimal {
        self.average_time + self.average_malus
    }
}
