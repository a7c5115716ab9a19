use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use super::ProfileDirectory;
use crate::error::Result;
use crate::models::{ParticipantId, ParticipantProfile, TeamId, TeamProfile};

#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileDirectory for PgProfileRepository {
    async fn participants(
        &self,
        ids: &[ParticipantId],
    ) -> Result<HashMap<ParticipantId, ParticipantProfile>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let profiles = sqlx::query_as::<_, ParticipantProfile>(
            r#"
            SELECT participant_id, first_name, last_name, is_public
            FROM participants
            WHERE participant_id = ANY($1)
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles
            .into_iter()
            .map(|profile| (profile.participant_id, profile))
            .collect())
    }

    async fn teams(&self, ids: &[TeamId]) -> Result<HashMap<TeamId, TeamProfile>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let teams = sqlx::query_as::<_, TeamProfile>(
            r#"
            SELECT team_id, name, is_public
            FROM teams
            WHERE team_id = ANY($1)
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(teams.into_iter().map(|team| (team.team_id, team)).collect())
    }

    async fn teams_of(&self, participant_id: ParticipantId) -> Result<Vec<TeamId>> {
        let team_ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT team_id
            FROM team_members
            WHERE participant_id = $1
            ORDER BY team_id
            "#,
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(team_ids)
    }
}
