use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::{LeaderboardView, PaginationParams, default_page, default_per_page};
use crate::models::{ParticipantId, Points, RaceId, ResultId, ResultKind, TeamId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Fastest total time first
    #[default]
    Best,
    /// Slowest total time first
    Worst,
}

/// Query parameters shared by the public leaderboard and personal results.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct LeaderboardFilter {
    /// Restrict to one race; omitted means every race
    pub race_id: Option<RaceId>,
    /// Case-insensitive match on participant or team name; personal results
    /// also match the race name
    pub search: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ResultKind,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for LeaderboardFilter {
    fn default() -> Self {
        Self {
            race_id: None,
            search: None,
            kind: ResultKind::default(),
            sort: SortOrder::default(),
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl LeaderboardFilter {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    pub fn search_term(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.pagination().validate()?;

        if let Some(race_id) = self.race_id
            && race_id < 1
        {
            return Err("race_id must be a positive id".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ExportFilter {
    pub race_id: Option<RaceId>,
    #[serde(rename = "type", default)]
    pub kind: ResultKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IndividualEntry {
    pub rank: u32,
    pub page: u32,
    pub result_id: ResultId,
    pub participant_id: ParticipantId,
    pub name: String,
    pub race_id: RaceId,
    pub race_name: String,
    pub race_date: Option<NaiveDate>,
    /// Elapsed time in seconds
    pub time: i64,
    /// Penalty in seconds
    pub malus: i64,
    pub total_time: i64,
    #[schema(value_type = Option<i32>)]
    pub points: Points,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TeamEntry {
    pub rank: u32,
    pub page: u32,
    pub result_id: ResultId,
    pub team_id: TeamId,
    pub team_name: String,
    pub race_id: RaceId,
    pub race_name: String,
    pub race_date: Option<NaiveDate>,
    pub average_time: Decimal,
    pub average_malus: Decimal,
    pub average_total_time: Decimal,
    pub member_count: i32,
    #[schema(value_type = Option<i32>)]
    pub points: Points,
}

/// A ranked page, shaped by the kind of result it holds.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Leaderboard {
    Individual(LeaderboardView<IndividualEntry>),
    Team(LeaderboardView<TeamEntry>),
}

impl Leaderboard {
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::Individual(_) => ResultKind::Individual,
            Self::Team(_) => ResultKind::Team,
        }
    }

    pub fn total(&self) -> u64 {
        match self {
            Self::Individual(view) => view.total,
            Self::Team(view) => view.total,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Individual(view) => view.data.len(),
            Self::Team(view) => view.data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
