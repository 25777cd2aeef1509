//! Migration scripts and their application to a live database.

use std::fmt;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use serde::{Deserialize, Serialize};

use blog_core::schema::{NamingConvention, SchemaSnapshot};

use crate::ddl;
use crate::error::{MigrationError, describe_revision};
use crate::ops::SchemaOp;
use crate::revision;

/// One step in the schema history.
///
/// `source` and `target` record the schema before and after the step, so a
/// script can be replayed (or its successor generated) without a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationScript {
    pub revision: String,
    pub down_revision: Option<String>,
    pub message: String,
    #[serde(default)]
    pub naming: NamingConvention,
    pub source: SchemaSnapshot,
    pub target: SchemaSnapshot,
    pub upgrade: Vec<SchemaOp>,
    pub downgrade: Vec<SchemaOp>,
}

impl MigrationScript {
    /// True when the script changes nothing.
    pub fn is_empty(&self) -> bool {
        self.upgrade.is_empty()
    }

    pub fn to_json(&self) -> Result<String, MigrationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, MigrationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply this script if the database sits at its parent revision.
    ///
    /// Already at this revision: nothing happens. Anywhere else: the call
    /// fails with [`MigrationError::SchemaMismatch`] before touching the
    /// schema. Operations and the revision marker commit together.
    pub async fn upgrade(&self, db: &DatabaseConnection) -> Result<MigrationOutcome, MigrationError> {
        let txn = db.begin().await?;
        revision::ensure(&txn).await?;
        let current = revision::read(&txn).await?;

        if current.as_deref() == Some(self.revision.as_str()) {
            txn.commit().await?;
            return Ok(MigrationOutcome::unchanged(current));
        }
        if current != self.down_revision {
            return Err(MigrationError::mismatch(
                current.as_deref(),
                self.down_revision.as_deref(),
            ));
        }

        self.apply_upgrade(&txn).await?;
        revision::write(&txn, Some(&self.revision)).await?;
        txn.commit().await?;

        Ok(MigrationOutcome {
            from: current,
            to: Some(self.revision.clone()),
            steps: 1,
        })
    }

    /// Revert this script if the database sits at its revision.
    ///
    /// Already at the parent revision: nothing happens. Anywhere else:
    /// [`MigrationError::SchemaMismatch`].
    pub async fn downgrade(
        &self,
        db: &DatabaseConnection,
    ) -> Result<MigrationOutcome, MigrationError> {
        let txn = db.begin().await?;
        revision::ensure(&txn).await?;
        let current = revision::read(&txn).await?;

        if current == self.down_revision {
            txn.commit().await?;
            return Ok(MigrationOutcome::unchanged(current));
        }
        if current.as_deref() != Some(self.revision.as_str()) {
            return Err(MigrationError::mismatch(
                current.as_deref(),
                Some(&self.revision),
            ));
        }

        self.apply_downgrade(&txn).await?;
        revision::write(&txn, self.down_revision.as_deref()).await?;
        txn.commit().await?;

        Ok(MigrationOutcome {
            from: current,
            to: self.down_revision.clone(),
            steps: 1,
        })
    }

    /// Run the upgrade operations inside `txn`. Leaves the revision marker alone.
    pub(crate) async fn apply_upgrade(&self, txn: &DatabaseTransaction) -> Result<(), MigrationError> {
        tracing::info!(
            revision = %self.revision,
            message = %self.message,
            "Upgrading {} -> {}",
            describe_revision(self.down_revision.as_deref()),
            self.revision
        );
        ddl::apply(txn, &self.upgrade, self.source.clone(), &self.naming).await
    }

    /// Run the downgrade operations inside `txn`. Leaves the revision marker alone.
    pub(crate) async fn apply_downgrade(
        &self,
        txn: &DatabaseTransaction,
    ) -> Result<(), MigrationError> {
        tracing::info!(
            revision = %self.revision,
            message = %self.message,
            "Downgrading {} -> {}",
            self.revision,
            describe_revision(self.down_revision.as_deref())
        );
        ddl::apply(txn, &self.downgrade, self.target.clone(), &self.naming).await
    }
}

/// What an upgrade or downgrade did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub from: Option<String>,
    pub to: Option<String>,
    /// Scripts applied or reverted.
    pub steps: usize,
}

impl MigrationOutcome {
    pub(crate) fn unchanged(revision: Option<String>) -> Self {
        Self {
            from: revision.clone(),
            to: revision,
            steps: 0,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.steps == 0
    }
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            write!(f, "already at {}", describe_revision(self.to.as_deref()))
        } else {
            write!(
                f,
                "{} -> {} ({} step{})",
                describe_revision(self.from.as_deref()),
                describe_revision(self.to.as_deref()),
                self.steps,
                if self.steps == 1 { "" } else { "s" }
            )
        }
    }
}
