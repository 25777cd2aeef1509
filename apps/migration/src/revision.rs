//! The revision marker: a one-row table holding the live revision id.
//!
//! No row means the database is at base.

use sea_orm::sea_query::{Alias, ColumnDef, Expr, Index, Query, Table};
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr};
use sea_orm_migration::SchemaManager;

use crate::error::MigrationError;

pub const REVISION_TABLE: &str = "schema_revision";
const REVISION_COLUMN: &str = "version_num";

/// Create the marker table if it is missing.
pub(crate) async fn ensure(txn: &DatabaseTransaction) -> Result<(), MigrationError> {
    let backend = txn.get_database_backend();
    let stmt = Table::create()
        .table(Alias::new(REVISION_TABLE))
        .if_not_exists()
        .col(
            ColumnDef::new(Alias::new(REVISION_COLUMN))
                .string_len(32)
                .not_null(),
        )
        .primary_key(
            Index::create()
                .name(format!("pk_{REVISION_TABLE}"))
                .col(Alias::new(REVISION_COLUMN)),
        )
        .to_owned();

    txn.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// The live revision, `None` at base.
pub(crate) async fn read<C: ConnectionTrait>(txn: &C) -> Result<Option<String>, MigrationError> {
    let backend = txn.get_database_backend();
    let stmt = Query::select()
        .column(Alias::new(REVISION_COLUMN))
        .from(Alias::new(REVISION_TABLE))
        .to_owned();

    let rows = txn.query_all(backend.build(&stmt)).await?;
    match rows.as_slice() {
        [] => Ok(None),
        [row] => Ok(Some(row.try_get::<String>("", REVISION_COLUMN)?)),
        _ => Err(MigrationError::BrokenChain(format!(
            "{REVISION_TABLE} holds {} rows",
            rows.len()
        ))),
    }
}

/// Like [`read`], but a database without the marker table is at base and
/// nothing is created.
pub(crate) async fn peek(db: &DatabaseConnection) -> Result<Option<String>, MigrationError> {
    if !SchemaManager::new(db).has_table(REVISION_TABLE).await? {
        return Ok(None);
    }
    read(db).await
}

/// Replace the live revision; `None` records base.
pub(crate) async fn write(
    txn: &DatabaseTransaction,
    revision: Option<&str>,
) -> Result<(), MigrationError> {
    let backend = txn.get_database_backend();
    let clear = Query::delete()
        .from_table(Alias::new(REVISION_TABLE))
        .to_owned();
    txn.execute(backend.build(&clear)).await?;

    if let Some(revision) = revision {
        let mut insert = Query::insert();
        insert
            .into_table(Alias::new(REVISION_TABLE))
            .columns([Alias::new(REVISION_COLUMN)]);
        insert
            .values([Expr::val(revision).into()])
            .map_err(|e| DbErr::Custom(e.to_string()))?;
        txn.execute(backend.build(&insert)).await?;
    }

    tracing::debug!(revision = revision.unwrap_or("base"), "Revision marker updated");
    Ok(())
}
