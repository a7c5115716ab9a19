use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use super::points::PointsFormula;
use super::ranking::{RankingEngine, RankingQuery, Visibility};
use crate::dto::leaderboard::Leaderboard;
use crate::dto::recalculation::{RaceRecalculation, RecalculationReport};
use crate::error::{Result, StorageError};
use crate::models::{Points, Race, RaceId, ResultId, ResultKind, ResultSelection};
use crate::repository::{PointsUpdate, RecalculationScope, ScopeLease};

#[derive(Debug, Clone)]
pub struct RecalculationConfig {
    /// Attempts to take a busy scope lease before giving up
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RecalculationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
        }
    }
}

/// Assigns points to result rows from each race's own full ranking.
///
/// Without `force`, only rows still holding [`Points::Unset`] are written, so
/// rerunning after a complete pass changes nothing and an interrupted run can
/// simply be started again. Each scope is read, ranked and written under the
/// store's scope lease, and committed before the next one starts.
#[derive(Clone)]
pub struct PointsRecalculator {
    engine: RankingEngine,
    formula: Arc<dyn PointsFormula>,
    config: RecalculationConfig,
}

impl PointsRecalculator {
    pub fn new(engine: RankingEngine, formula: Arc<dyn PointsFormula>) -> Self {
        Self {
            engine,
            formula,
            config: RecalculationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RecalculationConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn recalculate(
        &self,
        race_id: Option<RaceId>,
        selection: ResultSelection,
        force: bool,
    ) -> Result<RecalculationReport> {
        let results = self.engine.results();
        let races = match race_id {
            Some(race_id) => vec![
                results
                    .race(race_id)
                    .await?
                    .ok_or_else(|| StorageError::unknown_race(race_id))?,
            ],
            None => results.races().await?,
        };

        tracing::info!(
            "Recalculating points for {} race(s), selection {:?}, force {}",
            races.len(),
            selection,
            force
        );

        let mut report = RecalculationReport::default();

        for race in &races {
            for &kind in selection.kinds() {
                let outcome = self.recalculate_scope(race, kind, force).await?;
                report.push(outcome);
            }
        }

        tracing::info!(
            "Points recalculation finished: {} row(s) written, {} changed, {} ranked",
            report.written,
            report.updated,
            report.total
        );

        Ok(report)
    }

    pub async fn recalculate_scope(
        &self,
        race: &Race,
        kind: ResultKind,
        force: bool,
    ) -> Result<RaceRecalculation> {
        let scope = RecalculationScope {
            race_id: race.race_id,
            kind,
        };
        let lease = self.acquire(scope).await?;

        let query = RankingQuery::new(kind, Visibility::Everyone)
            .race(Some(race.race_id))
            .unpaginated();
        let standings = placed_rows(self.engine.rank(&query).await?);
        let field_size = standings.len() as u32;

        let updates: Vec<PointsUpdate> = standings
            .into_iter()
            .filter(|(_, _, current)| force || current.is_unset())
            .map(|(result_id, rank, _)| PointsUpdate {
                result_id,
                points: self.formula.points(rank, field_size),
            })
            .collect();

        let updated = if updates.is_empty() {
            0
        } else {
            self.engine
                .results()
                .store_points(kind, race.race_id, &updates)
                .await?
        };

        lease.release().await?;

        tracing::debug!(
            race_id = race.race_id,
            kind = %kind,
            total = field_size,
            written = updates.len(),
            updated,
            "Recalculated race points"
        );

        Ok(RaceRecalculation {
            race_id: race.race_id,
            race_name: race.name.clone(),
            kind,
            total: u64::from(field_size),
            written: updates.len() as u64,
            updated,
        })
    }

    async fn acquire(&self, scope: RecalculationScope) -> Result<ScopeLease> {
        let attempts = self.config.max_attempts.max(1);
        let mut backoff = self.config.initial_backoff;

        for attempt in 1..=attempts {
            if let Some(lease) = self.engine.results().try_lock_scope(scope).await? {
                return Ok(lease);
            }

            if attempt == attempts {
                break;
            }

            tracing::warn!(
                "Scope race {} ({}) is busy, retrying in {:?} (attempt {}/{})",
                scope.race_id,
                scope.kind,
                backoff,
                attempt,
                attempts
            );
            sleep(backoff).await;
            backoff = std::cmp::min(backoff * 2, self.config.max_backoff);
        }

        Err(StorageError::ConcurrentRecalculation {
            race_id: scope.race_id,
            kind: scope.kind,
        })
    }
}

fn placed_rows(board: Leaderboard) -> Vec<(ResultId, u32, Points)> {
    match board {
        Leaderboard::Individual(view) => view
            .data
            .into_iter()
            .map(|entry| (entry.result_id, entry.rank, entry.points))
            .collect(),
        Leaderboard::Team(view) => view
            .data
            .into_iter()
            .map(|entry| (entry.result_id, entry.rank, entry.points))
            .collect(),
    }
}
