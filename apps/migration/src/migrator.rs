//! The linear revision history and moving a database along it.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use sea_orm::{DatabaseConnection, TransactionTrait};

use blog_core::schema::SchemaSnapshot;

use crate::autogenerate::{GenerateOptions, generate_with};
use crate::error::{MigrationError, describe_revision};
use crate::revision;
use crate::script::{MigrationOutcome, MigrationScript};

/// Scripts compiled into the binary, in file order.
const EMBEDDED: &[&str] = &[include_str!("../migrations/0001_create_posts_table.json")];

/// Where to move the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// No scripts applied.
    Base,
    /// The newest script.
    Head,
    Revision(String),
}

impl FromStr for Target {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "base" => Target::Base,
            "head" => Target::Head,
            revision => Target::Revision(revision.to_string()),
        })
    }
}

/// An ordered chain of scripts from base to head.
#[derive(Debug, Clone, Default)]
pub struct Migrator {
    scripts: Vec<MigrationScript>,
}

impl Migrator {
    /// Order `scripts` into a chain.
    ///
    /// Fails with [`MigrationError::BrokenChain`] unless the scripts form a
    /// single line: one script at base, no revision with two children, and
    /// every script starting from the schema its parent ends at.
    pub fn new(scripts: Vec<MigrationScript>) -> Result<Self, MigrationError> {
        let mut seen = HashSet::new();
        let mut children: HashMap<Option<String>, MigrationScript> = HashMap::new();
        for script in scripts {
            if !seen.insert(script.revision.clone()) {
                return Err(MigrationError::BrokenChain(format!(
                    "revision {} appears twice",
                    script.revision
                )));
            }
            if let Some(sibling) = children.get(&script.down_revision) {
                return Err(MigrationError::BrokenChain(format!(
                    "{} and {} both follow {}",
                    sibling.revision,
                    script.revision,
                    describe_revision(script.down_revision.as_deref())
                )));
            }
            children.insert(script.down_revision.clone(), script);
        }

        let mut chain: Vec<MigrationScript> = Vec::with_capacity(children.len());
        let mut parent: Option<String> = None;
        let mut schema = SchemaSnapshot::empty();
        while let Some(script) = children.remove(&parent) {
            if script.source != schema {
                return Err(MigrationError::BrokenChain(format!(
                    "revision {} does not start where its parent ends",
                    script.revision
                )));
            }
            parent = Some(script.revision.clone());
            schema = script.target.clone();
            chain.push(script);
        }

        if let Some(orphan) = children.values().next() {
            return Err(MigrationError::BrokenChain(format!(
                "revision {} follows unknown revision {}",
                orphan.revision,
                describe_revision(orphan.down_revision.as_deref())
            )));
        }

        Ok(Self { scripts: chain })
    }

    /// The history shipped with this crate.
    pub fn embedded() -> Result<Self, MigrationError> {
        let scripts = EMBEDDED
            .iter()
            .map(|json| MigrationScript::from_json(json))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(scripts)
    }

    /// Scripts from base to head.
    pub fn history(&self) -> &[MigrationScript] {
        &self.scripts
    }

    pub fn head(&self) -> Option<&str> {
        self.scripts.last().map(|s| s.revision.as_str())
    }

    /// The schema once every script has been applied.
    pub fn head_schema(&self) -> SchemaSnapshot {
        self.scripts
            .last()
            .map(|s| s.target.clone())
            .unwrap_or_default()
    }

    /// The revision before `revision`; base stays at base.
    pub fn previous(&self, revision: Option<&str>) -> Result<Target, MigrationError> {
        let position = self.position(revision)?;
        Ok(match position {
            0 | 1 => Target::Base,
            n => Target::Revision(self.scripts[n - 2].revision.clone()),
        })
    }

    /// The live revision of `db`, `None` at base. Read-only.
    pub async fn current(&self, db: &DatabaseConnection) -> Result<Option<String>, MigrationError> {
        revision::peek(db).await
    }

    /// Apply every script between the live revision and `target`.
    ///
    /// All steps share one transaction: on failure the database is left at the
    /// revision it started from. A database already past `target`, or at a
    /// revision this history does not know, is a
    /// [`MigrationError::SchemaMismatch`].
    pub async fn upgrade(
        &self,
        db: &DatabaseConnection,
        target: Target,
    ) -> Result<MigrationOutcome, MigrationError> {
        let to = self.resolve(&target)?;
        let txn = db.begin().await?;
        revision::ensure(&txn).await?;
        let current = revision::read(&txn).await?;
        let from = self
            .position(current.as_deref())
            .map_err(|_| MigrationError::mismatch(current.as_deref(), self.revision_at(to)))?;

        if from > to {
            return Err(MigrationError::mismatch(
                current.as_deref(),
                self.revision_at(to),
            ));
        }
        if from == to {
            txn.commit().await?;
            tracing::info!(revision = ?current, "Database already up to date");
            return Ok(MigrationOutcome::unchanged(current));
        }

        for script in &self.scripts[from..to] {
            script.apply_upgrade(&txn).await?;
        }
        revision::write(&txn, self.revision_at(to)).await?;
        txn.commit().await?;

        let outcome = MigrationOutcome {
            from: current,
            to: self.revision_at(to).map(str::to_string),
            steps: to - from,
        };
        tracing::info!("Upgrade complete: {outcome}");
        Ok(outcome)
    }

    /// Revert every script between the live revision and `target`.
    ///
    /// Same transaction and mismatch rules as [`Migrator::upgrade`], mirrored.
    pub async fn downgrade(
        &self,
        db: &DatabaseConnection,
        target: Target,
    ) -> Result<MigrationOutcome, MigrationError> {
        let to = self.resolve(&target)?;
        let txn = db.begin().await?;
        revision::ensure(&txn).await?;
        let current = revision::read(&txn).await?;
        let from = self
            .position(current.as_deref())
            .map_err(|_| MigrationError::mismatch(current.as_deref(), self.revision_at(to)))?;

        if from < to {
            return Err(MigrationError::mismatch(
                current.as_deref(),
                self.revision_at(to),
            ));
        }
        if from == to {
            txn.commit().await?;
            tracing::info!(revision = ?current, "Nothing to downgrade");
            return Ok(MigrationOutcome::unchanged(current));
        }

        for script in self.scripts[to..from].iter().rev() {
            script.apply_downgrade(&txn).await?;
        }
        revision::write(&txn, self.revision_at(to)).await?;
        txn.commit().await?;

        let outcome = MigrationOutcome {
            from: current,
            to: self.revision_at(to).map(str::to_string),
            steps: from - to,
        };
        tracing::info!("Downgrade complete: {outcome}");
        Ok(outcome)
    }

    /// A script taking the head schema to `current`, chained after head.
    pub fn generate(
        &self,
        current: &SchemaSnapshot,
        mut options: GenerateOptions,
    ) -> Result<MigrationScript, MigrationError> {
        options.parent = self.head().map(str::to_string);
        generate_with(&self.head_schema(), current, &options)
    }

    /// True when the head schema already matches `current`.
    pub fn check(&self, current: &SchemaSnapshot) -> Result<bool, MigrationError> {
        Ok(self
            .generate(current, GenerateOptions::default())?
            .is_empty())
    }

    /// Number of scripts applied at `revision`.
    fn position(&self, revision: Option<&str>) -> Result<usize, MigrationError> {
        match revision {
            None => Ok(0),
            Some(revision) => self
                .scripts
                .iter()
                .position(|s| s.revision == revision)
                .map(|i| i + 1)
                .ok_or_else(|| MigrationError::UnknownRevision(revision.to_string())),
        }
    }

    fn resolve(&self, target: &Target) -> Result<usize, MigrationError> {
        match target {
            Target::Base => Ok(0),
            Target::Head => Ok(self.scripts.len()),
            Target::Revision(revision) => self.position(Some(revision)),
        }
    }

    fn revision_at(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .map(|i| self.scripts[i].revision.as_str())
    }
}
