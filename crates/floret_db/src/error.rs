//! Error types for the catalogue layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("filter column not allowed: {column}")]
    InvalidFilterColumn { column: String },
}

pub type Result<T> = std::result::Result<T, DbError>;
