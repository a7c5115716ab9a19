use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use super::{PointsUpdate, ProfileDirectory, RecalculationScope, ResultStore, ScopeLease, ScopeLocks};
use crate::error::Result;
use crate::models::{
    ParticipantId, ParticipantProfile, Points, Race, RaceId, RaceResult, ResultId, ResultKind,
    TeamId, TeamProfile, TeamResult,
};

/// In-process result store and profile directory.
///
/// Rows come back in insertion order. Scope leases are only exclusive among
/// callers sharing this store. Used by tests and local demos where no
/// Postgres instance is available.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryData>,
    locks: ScopeLocks,
}

#[derive(Default)]
struct MemoryData {
    races: BTreeMap<RaceId, Race>,
    participants: HashMap<ParticipantId, ParticipantProfile>,
    teams: HashMap<TeamId, TeamProfile>,
    rosters: BTreeMap<TeamId, Vec<ParticipantId>>,
    individual: Vec<RaceResult>,
    team: Vec<TeamResult>,
    last_result_id: ResultId,
}

impl MemoryData {
    fn next_result_id(&mut self) -> ResultId {
        self.last_result_id += 1;
        self.last_result_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_race(&self, race_id: RaceId, name: &str, race_date: Option<NaiveDate>) {
        self.inner.write().races.insert(
            race_id,
            Race {
                race_id,
                name: name.to_string(),
                race_date,
            },
        );
    }

    pub fn add_participant(
        &self,
        participant_id: ParticipantId,
        first_name: &str,
        last_name: &str,
        is_public: bool,
    ) {
        self.inner.write().participants.insert(
            participant_id,
            ParticipantProfile {
                participant_id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                is_public,
            },
        );
    }

    pub fn set_participant_public(&self, participant_id: ParticipantId, is_public: bool) {
        if let Some(profile) = self.inner.write().participants.get_mut(&participant_id) {
            profile.is_public = is_public;
        }
    }

    pub fn add_team(&self, team_id: TeamId, name: &str, is_public: bool, members: &[ParticipantId]) {
        let mut data = self.inner.write();
        data.teams.insert(
            team_id,
            TeamProfile {
                team_id,
                name: name.to_string(),
                is_public,
            },
        );
        data.rosters.insert(team_id, members.to_vec());
    }

    pub fn add_individual_result(
        &self,
        participant_id: ParticipantId,
        race_id: RaceId,
        time: i64,
        malus: i64,
    ) -> ResultId {
        let mut data = self.inner.write();
        let result_id = data.next_result_id();
        data.individual.push(RaceResult {
            result_id,
            participant_id,
            race_id,
            time,
            malus,
            points: Points::Unset,
        });
        result_id
    }

    pub fn add_team_result(
        &self,
        team_id: TeamId,
        race_id: RaceId,
        average_time: Decimal,
        average_malus: Decimal,
        member_count: i32,
    ) -> ResultId {
        let mut data = self.inner.write();
        let result_id = data.next_result_id();
        data.team.push(TeamResult {
            result_id,
            team_id,
            race_id,
            average_time,
            average_malus,
            member_count,
            points: Points::Unset,
        });
        result_id
    }

    /// Overwrites the points of any row, individual or team.
    pub fn set_points(&self, result_id: ResultId, points: Points) {
        let mut data = self.inner.write();
        if let Some(row) = data.individual.iter_mut().find(|r| r.result_id == result_id) {
            row.points = points;
        } else if let Some(row) = data.team.iter_mut().find(|r| r.result_id == result_id) {
            row.points = points;
        }
    }

    pub fn points(&self, result_id: ResultId) -> Option<Points> {
        let data = self.inner.read();
        data.individual
            .iter()
            .find(|r| r.result_id == result_id)
            .map(|r| r.points)
            .or_else(|| {
                data.team
                    .iter()
                    .find(|r| r.result_id == result_id)
                    .map(|r| r.points)
            })
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn race(&self, race_id: RaceId) -> Result<Option<Race>> {
        Ok(self.inner.read().races.get(&race_id).cloned())
    }

    async fn races(&self) -> Result<Vec<Race>> {
        let mut races: Vec<Race> = self.inner.read().races.values().cloned().collect();
        races.sort_by(|a, b| match (a.race_date, b.race_date) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.race_id.cmp(&b.race_id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.race_id.cmp(&b.race_id),
        });
        Ok(races)
    }

    async fn individual_results(&self, race_id: Option<RaceId>) -> Result<Vec<RaceResult>> {
        Ok(self
            .inner
            .read()
            .individual
            .iter()
            .filter(|row| race_id.is_none_or(|id| row.race_id == id))
            .cloned()
            .collect())
    }

    async fn team_results(&self, race_id: Option<RaceId>) -> Result<Vec<TeamResult>> {
        Ok(self
            .inner
            .read()
            .team
            .iter()
            .filter(|row| race_id.is_none_or(|id| row.race_id == id))
            .cloned()
            .collect())
    }

    async fn try_lock_scope(&self, scope: RecalculationScope) -> Result<Option<ScopeLease>> {
        Ok(self.locks.try_acquire(scope))
    }

    async fn store_points(
        &self,
        kind: ResultKind,
        race_id: RaceId,
        updates: &[PointsUpdate],
    ) -> Result<u64> {
        let mut data = self.inner.write();
        let mut changed = 0u64;

        for update in updates {
            let slot = match kind {
                ResultKind::Individual => data
                    .individual
                    .iter_mut()
                    .find(|r| r.result_id == update.result_id && r.race_id == race_id)
                    .map(|r| &mut r.points),
                ResultKind::Team => data
                    .team
                    .iter_mut()
                    .find(|r| r.result_id == update.result_id && r.race_id == race_id)
                    .map(|r| &mut r.points),
            };

            if let Some(points) = slot
                && *points != Points::Computed(update.points)
            {
                *points = Points::Computed(update.points);
                changed += 1;
            }
        }

        Ok(changed)
    }
}

#[async_trait]
impl ProfileDirectory for MemoryStore {
    async fn participants(
        &self,
        ids: &[ParticipantId],
    ) -> Result<HashMap<ParticipantId, ParticipantProfile>> {
        let data = self.inner.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.participants.get(id).map(|p| (*id, p.clone())))
            .collect())
    }

    async fn teams(&self, ids: &[TeamId]) -> Result<HashMap<TeamId, TeamProfile>> {
        let data = self.inner.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.teams.get(id).map(|t| (*id, t.clone())))
            .collect())
    }

    async fn teams_of(&self, participant_id: ParticipantId) -> Result<Vec<TeamId>> {
        Ok(self
            .inner
            .read()
            .rosters
            .iter()
            .filter(|(_, members)| members.contains(&participant_id))
            .map(|(team_id, _)| *team_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_points_stays_inside_race() {
        let store = MemoryStore::new();
        store.add_race(1, "Trail Lyon", None);
        store.add_race(2, "Marathon Paris", None);
        let in_race = store.add_individual_result(10, 1, 3600, 0);
        let other_race = store.add_individual_result(10, 2, 3600, 0);

        let changed = store
            .store_points(
                ResultKind::Individual,
                1,
                &[
                    PointsUpdate { result_id: in_race, points: 50 },
                    PointsUpdate { result_id: other_race, points: 50 },
                ],
            )
            .await
            .unwrap();

        assert_eq!(changed, 1);
        assert_eq!(store.points(in_race), Some(Points::Computed(50)));
        assert_eq!(store.points(other_race), Some(Points::Unset));
    }

    #[tokio::test]
    async fn test_races_sorted_by_date() {
        let store = MemoryStore::new();
        store.add_race(1, "Undated", None);
        store.add_race(2, "Later", NaiveDate::from_ymd_opt(2024, 6, 1));
        store.add_race(3, "Earlier", NaiveDate::from_ymd_opt(2024, 3, 1));

        let names: Vec<String> = store.races().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Earlier", "Later", "Undated"]);
    }

    #[tokio::test]
    async fn test_teams_of_reads_rosters() {
        let store = MemoryStore::new();
        store.add_team(1, "Red", true, &[10, 11]);
        store.add_team(2, "Blue", true, &[11]);

        assert_eq!(store.teams_of(10).await.unwrap(), vec![1]);
        assert_eq!(store.teams_of(11).await.unwrap(), vec![1, 2]);
        assert!(store.teams_of(12).await.unwrap().is_empty());
    }
}
