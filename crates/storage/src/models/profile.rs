use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{ParticipantId, TeamId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ParticipantProfile {
    pub participant_id: ParticipantId,
    pub first_name: String,
    pub last_name: String,
    pub is_public: bool,
}

impl ParticipantProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TeamProfile {
    pub team_id: TeamId,
    pub name: String,
    pub is_public: bool,
}
