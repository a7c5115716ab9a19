use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, QueryBuilder};

use super::{PointsUpdate, RecalculationScope, ResultStore, ScopeLease};
use crate::error::Result;
use crate::models::{Race, RaceId, RaceResult, ResultKind, TeamResult};

#[derive(FromRow)]
struct RaceResultRow {
    result_id: i64,
    participant_id: i64,
    race_id: i64,
    time_seconds: i64,
    malus_seconds: i64,
    points: Option<i32>,
}

impl From<RaceResultRow> for RaceResult {
    fn from(row: RaceResultRow) -> Self {
        Self {
            result_id: row.result_id,
            participant_id: row.participant_id,
            race_id: row.race_id,
            time: row.time_seconds,
            malus: row.malus_seconds,
            points: row.points.into(),
        }
    }
}

#[derive(FromRow)]
struct TeamResultRow {
    result_id: i64,
    team_id: i64,
    race_id: i64,
    average_time: Decimal,
    average_malus: Decimal,
    member_count: i32,
    points: Option<i32>,
}

impl From<TeamResultRow> for TeamResult {
    fn from(row: TeamResultRow) -> Self {
        Self {
            result_id: row.result_id,
            team_id: row.team_id,
            race_id: row.race_id,
            average_time: row.average_time,
            average_malus: row.average_malus,
            member_count: row.member_count,
            points: row.points.into(),
        }
    }
}

fn results_table(kind: ResultKind) -> &'static str {
    match kind {
        ResultKind::Individual => "race_results",
        ResultKind::Team => "team_results",
    }
}

#[derive(Clone)]
pub struct PgResultRepository {
    pool: PgPool,
}

impl PgResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for PgResultRepository {
    async fn race(&self, race_id: RaceId) -> Result<Option<Race>> {
        let race = sqlx::query_as::<_, Race>(
            r#"
            SELECT race_id, name, race_date
            FROM races
            WHERE race_id = $1
            "#,
        )
        .bind(race_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(race)
    }

    async fn races(&self) -> Result<Vec<Race>> {
        let races = sqlx::query_as::<_, Race>(
            r#"
            SELECT race_id, name, race_date
            FROM races
            ORDER BY race_date ASC NULLS LAST, race_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(races)
    }

    async fn individual_results(&self, race_id: Option<RaceId>) -> Result<Vec<RaceResult>> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT result_id, participant_id, race_id, time_seconds, malus_seconds, points
            FROM race_results
            WHERE 1=1
            "#,
        );

        if let Some(race_id) = race_id {
            query.push(" AND race_id = ");
            query.push_bind(race_id);
        }

        query.push(" ORDER BY result_id");

        let rows: Vec<RaceResultRow> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(RaceResult::from).collect())
    }

    async fn team_results(&self, race_id: Option<RaceId>) -> Result<Vec<TeamResult>> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT result_id, team_id, race_id, average_time, average_malus, member_count, points
            FROM team_results
            WHERE 1=1
            "#,
        );

        if let Some(race_id) = race_id {
            query.push(" AND race_id = ");
            query.push_bind(race_id);
        }

        query.push(" ORDER BY result_id");

        let rows: Vec<TeamResultRow> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(TeamResult::from).collect())
    }

    async fn try_lock_scope(&self, scope: RecalculationScope) -> Result<Option<ScopeLease>> {
        let mut tx = self.pool.begin().await?;

        let acquired: bool =
            sqlx::query_scalar("SELECT pg_try_advisory_xact_lock(hashtextextended($1, $2))")
                .bind(results_table(scope.kind))
                .bind(scope.race_id)
                .fetch_one(&mut *tx)
                .await?;

        if acquired {
            Ok(Some(ScopeLease::Postgres(tx)))
        } else {
            tx.rollback().await?;
            Ok(None)
        }
    }

    async fn store_points(
        &self,
        kind: ResultKind,
        race_id: RaceId,
        updates: &[PointsUpdate],
    ) -> Result<u64> {
        let table = results_table(kind);
        let statement = format!(
            r#"
            UPDATE {table} AS target
            SET points = $1
            FROM (SELECT result_id, points FROM {table} WHERE result_id = $2 AND race_id = $3) AS previous
            WHERE target.result_id = previous.result_id
            RETURNING previous.points IS DISTINCT FROM $1
            "#
        );

        let mut tx = self.pool.begin().await?;
        let mut changed = 0u64;

        for update in updates {
            let differs: Option<bool> = sqlx::query_scalar(&statement)
                .bind(update.points)
                .bind(update.result_id)
                .bind(race_id)
                .fetch_optional(&mut *tx)
                .await?;

            if differs == Some(true) {
                changed += 1;
            }
        }

        tx.commit().await?;

        Ok(changed)
    }
}
