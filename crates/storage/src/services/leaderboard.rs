use super::ensure_race;
use super::ranking::{RankingEngine, RankingQuery, Visibility};
use crate::dto::leaderboard::{Leaderboard, LeaderboardFilter};
use crate::error::Result;
use crate::models::{ParticipantId, Race};

/// Read side of the leaderboard: public rankings and a participant's own results.
#[derive(Clone)]
pub struct LeaderboardQuery {
    engine: RankingEngine,
}

impl LeaderboardQuery {
    pub fn new(engine: RankingEngine) -> Self {
        Self { engine }
    }

    /// Public profiles only, paginated.
    pub async fn public_leaderboard(&self, filter: &LeaderboardFilter) -> Result<Leaderboard> {
        self.run(filter, Visibility::PublicOnly).await
    }

    /// Every result of `participant_id` (or of their teams), public or not.
    pub async fn my_results(
        &self,
        participant_id: ParticipantId,
        filter: &LeaderboardFilter,
    ) -> Result<Leaderboard> {
        self.run(filter, Visibility::Owner(participant_id)).await
    }

    pub async fn races(&self) -> Result<Vec<Race>> {
        self.engine.results().races().await
    }

    async fn run(&self, filter: &LeaderboardFilter, visibility: Visibility) -> Result<Leaderboard> {
        ensure_race(self.engine.results().as_ref(), filter.race_id).await?;

        let query = RankingQuery::new(filter.kind, visibility)
            .race(filter.race_id)
            .search(filter.search_term())
            .sort(filter.sort)
            .page(filter.pagination());

        self.engine.rank(&query).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dto::common::LeaderboardView;
    use crate::dto::leaderboard::{IndividualEntry, SortOrder};
    use crate::error::StorageError;
    use crate::models::ResultKind;
    use crate::repository::MemoryStore;

    fn leaderboard(store: &Arc<MemoryStore>) -> LeaderboardQuery {
        LeaderboardQuery::new(RankingEngine::new(store.clone(), store.clone()))
    }

    fn individuals(board: Leaderboard) -> LeaderboardView<IndividualEntry> {
        match board {
            Leaderboard::Individual(view) => view,
            Leaderboard::Team(_) => panic!("expected an individual leaderboard"),
        }
    }

    fn two_races() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_race(1, "Marathon Paris", None);
        store.add_race(2, "Trail Lyon", None);
        store.add_participant(1, "Claire", "Petit", false);
        store.add_participant(2, "David", "Roux", true);
        store.add_individual_result(1, 1, 12600, 0);
        store.add_individual_result(1, 2, 9000, 60);
        store.add_individual_result(2, 1, 12000, 0);
        store
    }

    #[tokio::test]
    async fn test_public_leaderboard_for_race() {
        let store = two_races();

        let filter = LeaderboardFilter {
            race_id: Some(1),
            ..LeaderboardFilter::default()
        };
        let view = individuals(leaderboard(&store).public_leaderboard(&filter).await.unwrap());

        assert_eq!(view.data.len(), 1);
        assert_eq!(view.data[0].participant_id, 2);
        assert_eq!(view.data[0].rank, 1);
        assert_eq!(view.per_page, 20);
    }

    #[tokio::test]
    async fn test_my_results_search_selects_race() {
        let store = two_races();

        let filter = LeaderboardFilter {
            search: Some("Marathon".to_string()),
            sort: SortOrder::Best,
            kind: ResultKind::Individual,
            ..LeaderboardFilter::default()
        };
        let view = individuals(leaderboard(&store).my_results(1, &filter).await.unwrap());

        assert_eq!(view.data.len(), 1);
        assert_eq!(view.data[0].race_name, "Marathon Paris");
        assert_eq!(view.data[0].rank, 1);
    }

    #[tokio::test]
    async fn test_public_search_by_race_name_finds_nobody() {
        let store = two_races();

        let filter = LeaderboardFilter {
            race_id: Some(1),
            search: Some("marathon".to_string()),
            ..LeaderboardFilter::default()
        };
        let view = individuals(leaderboard(&store).public_leaderboard(&filter).await.unwrap());

        assert!(view.data.is_empty());
    }

    #[tokio::test]
    async fn test_my_results_spans_all_races() {
        let store = two_races();

        let filter = LeaderboardFilter {
            sort: SortOrder::Worst,
            ..LeaderboardFilter::default()
        };
        let view = individuals(leaderboard(&store).my_results(1, &filter).await.unwrap());

        let races: Vec<String> = view.data.iter().map(|e| e.race_name.clone()).collect();
        assert_eq!(races, vec!["Marathon Paris", "Trail Lyon"]);
        assert!(view.data.iter().all(|e| e.participant_id == 1));
    }

    #[tokio::test]
    async fn test_unknown_race_is_rejected() {
        let store = two_races();

        let filter = LeaderboardFilter {
            race_id: Some(99),
            ..LeaderboardFilter::default()
        };
        let err = leaderboard(&store)
            .public_leaderboard(&filter)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::InvalidScope(_)));
    }

    #[tokio::test]
    async fn test_team_leaderboard_shape() {
        let store = two_races();
        store.add_team(5, "Les Rapides", true, &[1, 2]);
        store.add_team_result(5, 1, "12300".parse().unwrap(), "30".parse().unwrap(), 2);

        let filter = LeaderboardFilter {
            kind: ResultKind::Team,
            ..LeaderboardFilter::default()
        };
        let board = leaderboard(&store).public_leaderboard(&filter).await.unwrap();

        assert_eq!(board.kind(), ResultKind::Team);
        assert_eq!(board.total(), 1);
    }
}
