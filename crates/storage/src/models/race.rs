use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::RaceId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Race {
    pub race_id: RaceId,
    pub name: String,
    pub race_date: Option<NaiveDate>,
}
