//! Flat read/write access to result rows and profiles.
//!
//! The ranking services only see plain records through these traits; joins
//! between results, races and profiles happen in the services.

pub mod locks;
pub mod memory;
pub mod profiles;
pub mod results;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    ParticipantId, ParticipantProfile, Race, RaceId, RaceResult, ResultId, ResultKind, TeamId,
    TeamProfile, TeamResult,
};

pub use locks::{RecalculationScope, ScopeLease, ScopeLocks};
pub use memory::MemoryStore;
pub use profiles::PgProfileRepository;
pub use results::PgResultRepository;

/// New points value for a single result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsUpdate {
    pub result_id: ResultId,
    pub points: i32,
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn race(&self, race_id: RaceId) -> Result<Option<Race>>;

    /// Every race, oldest first.
    async fn races(&self) -> Result<Vec<Race>>;

    async fn individual_results(&self, race_id: Option<RaceId>) -> Result<Vec<RaceResult>>;

    async fn team_results(&self, race_id: Option<RaceId>) -> Result<Vec<TeamResult>>;

    /// Takes the exclusive lease on a scope without waiting; `None` while any
    /// other holder, in this process or another, owns it.
    async fn try_lock_scope(&self, scope: RecalculationScope) -> Result<Option<ScopeLease>>;

    /// Writes all updates for one race atomically and returns the number of
    /// rows whose value changed. Rows outside `race_id` are never touched.
    async fn store_points(
        &self,
        kind: ResultKind,
        race_id: RaceId,
        updates: &[PointsUpdate],
    ) -> Result<u64>;
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn participants(
        &self,
        ids: &[ParticipantId],
    ) -> Result<HashMap<ParticipantId, ParticipantProfile>>;

    async fn teams(&self, ids: &[TeamId]) -> Result<HashMap<TeamId, TeamProfile>>;

    /// Teams whose roster contains the participant.
    async fn teams_of(&self, participant_id: ParticipantId) -> Result<Vec<TeamId>>;
}
