//! Error types for the battleship service.

use thiserror::Error;

/// Errors raised while generating, rerolling or looking up programs.
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Internal assertion; the dice generator could not find a differing pair.
    #[error("generation invariant violated: {0}")]
    GenerationInvariantViolation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur in the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("invalid JSON column: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt value in {column}: {value}")]
    Corrupt { column: &'static str, value: String },
}
