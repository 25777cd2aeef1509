//! Schema migrations for the blog database.
//!
//! Scripts are generated by diffing two [`SchemaSnapshot`]s, stored as JSON,
//! and chained by revision id. The live revision is kept in a one-row
//! `schema_revision` table.
//!
//! [`SchemaSnapshot`]: blog_core::schema::SchemaSnapshot

pub mod autogenerate;
mod ddl;
pub mod directory;
pub mod error;
pub mod migrator;
pub mod ops;
mod revision;
pub mod script;

pub use autogenerate::{ColumnRename, GenerateOptions, generate, generate_with};
pub use directory::ScriptDirectory;
pub use error::{MigrationError, describe_revision};
pub use migrator::{Migrator, Target};
pub use ops::SchemaOp;
pub use revision::REVISION_TABLE;
pub use script::{MigrationOutcome, MigrationScript};
