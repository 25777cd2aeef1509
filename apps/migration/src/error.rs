//! Migration error types.

use sea_orm::DbErr;
use thiserror::Error;

/// Failures of script generation and of applying scripts to a database.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The live revision is unknown or on the wrong side of the target.
    /// Nothing has been applied.
    #[error("Schema mismatch: database is at {found}, expected {expected}")]
    SchemaMismatch { found: String, expected: String },

    #[error("Unknown revision: {0}")]
    UnknownRevision(String),

    #[error("Unsupported schema change: {0}")]
    UnsupportedChange(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Broken revision chain: {0}")]
    BrokenChain(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Script serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrationError {
    pub(crate) fn mismatch(found: Option<&str>, expected: Option<&str>) -> Self {
        Self::SchemaMismatch {
            found: describe_revision(found),
            expected: describe_revision(expected),
        }
    }
}

/// Human-readable revision, `base` for an unversioned database.
pub fn describe_revision(revision: Option<&str>) -> String {
    revision.unwrap_or("base").to_string()
}
