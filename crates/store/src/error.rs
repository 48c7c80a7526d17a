//! Typed error type for the store crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("operation not found")]
    NotFound,

    #[error("operation id already exists")]
    AlreadyExists,

    #[error("invalid operation state in store: {0}")]
    InvalidState(String),

    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
