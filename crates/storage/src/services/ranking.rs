//! Turns raw result rows into ranked, filtered, paginated leaderboards.
//!
//! Ranks are positions in the list that survives visibility and search
//! filtering, so hiding an entry never leaves a gap. Ordering is total time
//! (ascending for [`SortOrder::Best`]), then subject id, then result id.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::dto::common::{LeaderboardView, PaginationParams};
use crate::dto::leaderboard::{IndividualEntry, Leaderboard, SortOrder, TeamEntry};
use crate::error::Result;
use crate::models::{
    ParticipantId, ParticipantProfile, Race, RaceId, RaceResult, ResultId, ResultKind, TeamId,
    TeamResult,
};
use crate::repository::{ProfileDirectory, ResultStore};

/// Which rows a caller is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Rows whose participant or team profile is public
    PublicOnly,
    /// Rows of this participant, or of teams listing them, public or not
    Owner(ParticipantId),
    /// Every row; used when computing points
    Everyone,
}

impl Visibility {
    /// Personal results are searched by race name as well as by name.
    fn searches_race_name(self) -> bool {
        matches!(self, Visibility::Owner(_))
    }
}

#[derive(Debug, Clone)]
pub struct RankingQuery {
    pub race_id: Option<RaceId>,
    pub kind: ResultKind,
    pub visibility: Visibility,
    pub search: String,
    pub sort: SortOrder,
    /// `None` returns every entry on a single page.
    pub pagination: Option<PaginationParams>,
}

impl RankingQuery {
    pub fn new(kind: ResultKind, visibility: Visibility) -> Self {
        Self {
            race_id: None,
            kind,
            visibility,
            search: String::new(),
            sort: SortOrder::Best,
            pagination: Some(PaginationParams::default()),
        }
    }

    pub fn race(mut self, race_id: Option<RaceId>) -> Self {
        self.race_id = race_id;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, pagination: PaginationParams) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn unpaginated(mut self) -> Self {
        self.pagination = None;
        self
    }
}

/// A leaderboard row that can be ordered and placed.
pub trait Standing {
    /// Participant or team id, used to break ties.
    fn subject_id(&self) -> i64;
    fn result_id(&self) -> ResultId;
    fn total(&self) -> Decimal;
    fn set_rank(&mut self, rank: u32);
    fn set_page(&mut self, page: u32);
}

impl Standing for IndividualEntry {
    fn subject_id(&self) -> i64 {
        self.participant_id
    }

    fn result_id(&self) -> ResultId {
        self.result_id
    }

    fn total(&self) -> Decimal {
        Decimal::from(self.total_time)
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }

    fn set_page(&mut self, page: u32) {
        self.page = page;
    }
}

impl Standing for TeamEntry {
    fn subject_id(&self) -> i64 {
        self.team_id
    }

    fn result_id(&self) -> ResultId {
        self.result_id
    }

    fn total(&self) -> Decimal {
        self.average_total_time
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }

    fn set_page(&mut self, page: u32) {
        self.page = page;
    }
}

fn compare<T: Standing>(a: &T, b: &T, sort: SortOrder) -> Ordering {
    let by_time = match sort {
        SortOrder::Best => a.total().cmp(&b.total()),
        SortOrder::Worst => b.total().cmp(&a.total()),
    };

    by_time
        .then_with(|| a.subject_id().cmp(&b.subject_id()))
        .then_with(|| a.result_id().cmp(&b.result_id()))
}

/// Sorts the entries and numbers them 1..=N.
pub fn rank_entries<T: Standing>(mut entries: Vec<T>, sort: SortOrder) -> Vec<T> {
    entries.sort_by(|a, b| compare(a, b, sort));

    for (position, entry) in entries.iter_mut().enumerate() {
        entry.set_rank(position as u32 + 1);
    }

    entries
}

/// Cuts one page out of an already ranked list.
pub fn paginate<T: Standing>(
    entries: Vec<T>,
    pagination: Option<PaginationParams>,
) -> LeaderboardView<T> {
    let total = entries.len();
    let (current_page, per_page, offset) = match pagination {
        Some(params) => (params.page.max(1), params.limit(), params.offset()),
        None => (1, total.max(1), 0),
    };

    let data = entries
        .into_iter()
        .enumerate()
        .skip(offset)
        .take(per_page)
        .map(|(position, mut entry)| {
            entry.set_page((position / per_page) as u32 + 1);
            entry
        })
        .collect();

    LeaderboardView::new(data, current_page, per_page as u32, total as u64)
}

struct SearchTerm(Option<String>);

impl SearchTerm {
    fn new(raw: &str) -> Self {
        let needle = raw.trim();
        if needle.is_empty() {
            Self(None)
        } else {
            Self(Some(needle.to_lowercase()))
        }
    }

    fn matches(&self, name: &str, race_name: Option<&str>) -> bool {
        match &self.0 {
            None => true,
            Some(needle) => std::iter::once(name)
                .chain(race_name)
                .any(|field| field.to_lowercase().contains(needle.as_str())),
        }
    }
}

fn distinct(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}

fn individual_entry(row: RaceResult, name: String, race: Option<&Race>) -> IndividualEntry {
    IndividualEntry {
        rank: 0,
        page: 0,
        total_time: row.total_time(),
        result_id: row.result_id,
        participant_id: row.participant_id,
        name,
        race_id: row.race_id,
        race_name: race.map(|r| r.name.clone()).unwrap_or_default(),
        race_date: race.and_then(|r| r.race_date),
        time: row.time,
        malus: row.malus,
        points: row.points,
    }
}

fn team_entry(row: TeamResult, team_name: String, race: Option<&Race>) -> TeamEntry {
    TeamEntry {
        rank: 0,
        page: 0,
        average_total_time: row.average_total_time(),
        result_id: row.result_id,
        team_id: row.team_id,
        team_name,
        race_id: row.race_id,
        race_name: race.map(|r| r.name.clone()).unwrap_or_default(),
        race_date: race.and_then(|r| r.race_date),
        average_time: row.average_time,
        average_malus: row.average_malus,
        member_count: row.member_count,
        points: row.points,
    }
}

#[derive(Clone)]
pub struct RankingEngine {
    results: Arc<dyn ResultStore>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl RankingEngine {
    pub fn new(results: Arc<dyn ResultStore>, profiles: Arc<dyn ProfileDirectory>) -> Self {
        Self { results, profiles }
    }

    pub fn results(&self) -> &Arc<dyn ResultStore> {
        &self.results
    }

    pub async fn rank(&self, query: &RankingQuery) -> Result<Leaderboard> {
        let board = match query.kind {
            ResultKind::Individual => Leaderboard::Individual(self.rank_individuals(query).await?),
            ResultKind::Team => Leaderboard::Team(self.rank_teams(query).await?),
        };

        tracing::debug!(
            kind = %query.kind,
            race_id = ?query.race_id,
            total = board.total(),
            "Ranked leaderboard"
        );

        Ok(board)
    }

    pub async fn rank_individuals(
        &self,
        query: &RankingQuery,
    ) -> Result<LeaderboardView<IndividualEntry>> {
        let rows = self.results.individual_results(query.race_id).await?;
        let races = self.race_index(query.race_id).await?;
        let ids = distinct(rows.iter().map(|row| row.participant_id));
        let profiles = self.profiles.participants(&ids).await?;
        let search = SearchTerm::new(&query.search);

        let entries = rows
            .into_iter()
            .filter(|row| match query.visibility {
                Visibility::PublicOnly => profiles
                    .get(&row.participant_id)
                    .is_some_and(|profile| profile.is_public),
                Visibility::Owner(participant_id) => row.participant_id == participant_id,
                Visibility::Everyone => true,
            })
            .map(|row| {
                let name = profiles
                    .get(&row.participant_id)
                    .map(ParticipantProfile::full_name)
                    .unwrap_or_default();
                let race = races.get(&row.race_id);
                individual_entry(row, name, race)
            })
            .filter(|entry| {
                let race_name = query.visibility.searches_race_name().then_some(entry.race_name.as_str());
                search.matches(&entry.name, race_name)
            })
            .collect();

        Ok(paginate(rank_entries(entries, query.sort), query.pagination))
    }

    pub async fn rank_teams(&self, query: &RankingQuery) -> Result<LeaderboardView<TeamEntry>> {
        let rows = self.results.team_results(query.race_id).await?;
        let races = self.race_index(query.race_id).await?;
        let ids = distinct(rows.iter().map(|row| row.team_id));
        let teams = self.profiles.teams(&ids).await?;
        let owned: HashSet<TeamId> = match query.visibility {
            Visibility::Owner(participant_id) => self
                .profiles
                .teams_of(participant_id)
                .await?
                .into_iter()
                .collect(),
            _ => HashSet::new(),
        };
        let search = SearchTerm::new(&query.search);

        let entries = rows
            .into_iter()
            .filter(|row| match query.visibility {
                Visibility::PublicOnly => teams.get(&row.team_id).is_some_and(|team| team.is_public),
                Visibility::Owner(_) => owned.contains(&row.team_id),
                Visibility::Everyone => true,
            })
            .map(|row| {
                let name = teams
                    .get(&row.team_id)
                    .map(|team| team.name.clone())
                    .unwrap_or_default();
                let race = races.get(&row.race_id);
                team_entry(row, name, race)
            })
            .filter(|entry| {
                let race_name = query.visibility.searches_race_name().then_some(entry.race_name.as_str());
                search.matches(&entry.team_name, race_name)
            })
            .collect();

        Ok(paginate(rank_entries(entries, query.sort), query.pagination))
    }

    async fn race_index(&self, race_id: Option<RaceId>) -> Result<HashMap<RaceId, Race>> {
        let races: Vec<Race> = match race_id {
            Some(race_id) => self.results.race(race_id).await?.into_iter().collect(),
            None => self.results.races().await?,
        };

        Ok(races.into_iter().map(|race| (race.race_id, race)).collect())
    }
}
