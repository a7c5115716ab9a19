use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecalcError>;

#[derive(Error, Debug)]
pub enum RecalcError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::error::StorageError),

    #[error("Invalid points formula: {0}")]
    FormulaError(String),
}
