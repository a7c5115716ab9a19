use thiserror::Error;

use crate::models::{RaceId, ResultKind};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Points recalculation already running for race {race_id} ({kind})")]
    ConcurrentRecalculation { race_id: RaceId, kind: ResultKind },
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn unknown_race(race_id: RaceId) -> Self {
        Self::InvalidScope(format!("race {} does not exist", race_id))
    }

    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::ConcurrentRecalculation { .. })
    }
}
