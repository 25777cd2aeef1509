//! Domain-level error types.

use thiserror::Error;

/// Repository-level errors.
///
/// Storage implementations surface their failures through this type unchanged;
/// callers decide how to present them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl RepoError {
    /// A required column was left unset.
    pub fn not_null(table: &str, column: &str) -> Self {
        Self::ConstraintViolation(format!("NOT NULL constraint failed: {table}.{column}"))
    }
}
