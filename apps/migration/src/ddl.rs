//! Lowering of [`SchemaOp`]s to DDL for the connected backend.
//!
//! SQLite cannot change a column's nullability or add a `NOT NULL` column in
//! place; those operations rebuild the table under a temporary name, copy the
//! rows across and swap it in.

use sea_orm::sea_query::{
    Alias, ColumnDef, Index, IndexCreateStatement, Query, Table, TableCreateStatement,
};
use sea_orm::{ConnectionTrait, DatabaseTransaction, DbBackend, DbErr, Statement};
use sea_orm_migration::SchemaManager;

use blog_core::schema::{ColumnSchema, ColumnType, NamingConvention, SchemaSnapshot, TableSchema};

use crate::error::MigrationError;
use crate::ops::SchemaOp;

/// Apply `ops` in order inside `txn`.
///
/// `schema` is the schema the database holds before the first operation; it
/// is advanced after each one so table rebuilds know the full definition.
pub(crate) async fn apply(
    txn: &DatabaseTransaction,
    ops: &[SchemaOp],
    mut schema: SchemaSnapshot,
    naming: &NamingConvention,
) -> Result<(), MigrationError> {
    let manager = SchemaManager::new(txn);

    for op in ops {
        let mut next = schema.clone();
        op.apply(&mut next)?;

        tracing::debug!(table = op.table_name(), ?op, "Applying schema operation");
        lower(&manager, txn, op, &schema, &next, naming).await?;

        schema = next;
    }
    Ok(())
}

async fn lower(
    manager: &SchemaManager<'_>,
    txn: &DatabaseTransaction,
    op: &SchemaOp,
    before: &SchemaSnapshot,
    after: &SchemaSnapshot,
    naming: &NamingConvention,
) -> Result<(), MigrationError> {
    let backend = txn.get_database_backend();

    match op {
        SchemaOp::CreateTable { table, primary_key } => {
            manager
                .create_table(create_table(table, primary_key.as_deref(), backend))
                .await?;
        }
        SchemaOp::DropTable { table, .. } => {
            manager
                .drop_table(Table::drop().table(Alias::new(table.name.as_str())).to_owned())
                .await?;
        }
        SchemaOp::AddColumn { table, column } => {
            if backend == DbBackend::Sqlite && !column.nullable {
                rebuild_table(manager, txn, before, after, table, naming).await?;
            } else {
                manager
                    .alter_table(
                        Table::alter()
                            .table(Alias::new(table.as_str()))
                            .add_column(&mut column_def(column, backend))
                            .to_owned(),
                    )
                    .await?;
            }
        }
        SchemaOp::DropColumn { table, column } => {
            manager
                .alter_table(
                    Table::alter()
                        .table(Alias::new(table.as_str()))
                        .drop_column(Alias::new(column.name.as_str()))
                        .to_owned(),
                )
                .await?;
        }
        SchemaOp::RenameColumn { table, from, to } => {
            manager
                .alter_table(
                    Table::alter()
                        .table(Alias::new(table.as_str()))
                        .rename_column(Alias::new(from.as_str()), Alias::new(to.as_str()))
                        .to_owned(),
                )
                .await?;
        }
        SchemaOp::AlterNullability {
            table,
            column,
            nullable,
        } => match backend {
            DbBackend::Sqlite => rebuild_table(manager, txn, before, after, table, naming).await?,
            DbBackend::Postgres => {
                let sql = format!(
                    "ALTER TABLE {} ALTER COLUMN {} {} NOT NULL",
                    quote(table),
                    quote(column),
                    if *nullable { "DROP" } else { "SET" }
                );
                txn.execute(Statement::from_string(backend, sql)).await?;
            }
            other => {
                return Err(MigrationError::UnsupportedChange(format!(
                    "{table}.{column}: nullability changes are not supported on {other:?}"
                )));
            }
        },
        SchemaOp::CreateIndex {
            table,
            name,
            column,
            unique,
        } => {
            manager
                .create_index(create_index(table, name, column, *unique))
                .await?;
        }
        SchemaOp::DropIndex { table, name, .. } => {
            manager
                .drop_index(
                    Index::drop()
                        .name(name.as_str())
                        .table(Alias::new(table.as_str()))
                        .to_owned(),
                )
                .await?;
        }
    }
    Ok(())
}

fn column_def(column: &ColumnSchema, backend: DbBackend) -> ColumnDef {
    let mut def = ColumnDef::new(Alias::new(column.name.as_str()));
    match column.column_type {
        ColumnType::Integer => def.integer(),
        ColumnType::Text => def.text(),
        ColumnType::Timestamp => def.timestamp_with_time_zone(),
    };
    if !column.nullable {
        def.not_null();
    }
    // SQLite only accepts AUTOINCREMENT on a column-level key; see `rowid_key`.
    if column.auto_increment && backend != DbBackend::Sqlite {
        def.auto_increment();
    }
    def
}

/// The single auto-increment INTEGER key of `table` on SQLite, which has to be
/// declared on the column as `PRIMARY KEY AUTOINCREMENT` so deleted ids are
/// never handed out again.
fn rowid_key(table: &TableSchema, backend: DbBackend) -> Option<&ColumnSchema> {
    if backend != DbBackend::Sqlite {
        return None;
    }
    match table.primary_key().as_slice() {
        [name] => table
            .column(name)
            .filter(|c| c.auto_increment && c.column_type == ColumnType::Integer),
        _ => None,
    }
}

fn create_table(
    table: &TableSchema,
    primary_key: Option<&str>,
    backend: DbBackend,
) -> TableCreateStatement {
    let rowid = rowid_key(table, backend).map(|c| c.name.as_str());

    let mut stmt = Table::create();
    stmt.table(Alias::new(table.name.as_str()));
    for column in &table.columns {
        let mut def = column_def(column, backend);
        if rowid == Some(column.name.as_str()) {
            def.primary_key().auto_increment();
        }
        stmt.col(&mut def);
    }

    let key = table.primary_key();
    if !key.is_empty() && rowid.is_none() {
        let mut index = Index::create();
        if let Some(name) = primary_key {
            index.name(name);
        }
        for column in key {
            index.col(Alias::new(column));
        }
        stmt.primary_key(&mut index);
    }
    stmt.to_owned()
}

fn create_index(table: &str, name: &str, column: &str, unique: bool) -> IndexCreateStatement {
    let mut stmt = Index::create();
    stmt.name(name)
        .table(Alias::new(table))
        .col(Alias::new(column));
    if unique {
        stmt.unique();
    }
    stmt.to_owned()
}

/// Rebuild `table` so it matches its definition in `after`, keeping the rows
/// of every column that exists on both sides.
async fn rebuild_table(
    manager: &SchemaManager<'_>,
    txn: &DatabaseTransaction,
    before: &SchemaSnapshot,
    after: &SchemaSnapshot,
    table: &str,
    naming: &NamingConvention,
) -> Result<(), MigrationError> {
    let missing = || MigrationError::InvalidOperation(format!("table {table} does not exist"));
    let old = before.table(table).ok_or_else(missing)?;
    let new = after.table(table).ok_or_else(missing)?;
    let backend = txn.get_database_backend();
    let staging = format!("_{table}_rebuild");

    tracing::debug!(table, "Rebuilding table");

    let mut staged = new.clone();
    staged.name = staging.clone();
    let primary_key = naming.primary_key_name(table);
    manager
        .create_table(create_table(&staged, Some(&primary_key), backend))
        .await?;

    let shared: Vec<Alias> = new
        .columns
        .iter()
        .filter(|c| old.column(&c.name).is_some())
        .map(|c| Alias::new(c.name.as_str()))
        .collect();
    if !shared.is_empty() {
        let select = Query::select()
            .columns(shared.clone())
            .from(Alias::new(table))
            .to_owned();
        let mut copy = Query::insert();
        copy.into_table(Alias::new(staging.as_str()))
            .columns(shared);
        copy.select_from(select)
            .map_err(|e| DbErr::Custom(e.to_string()))?;
        txn.execute(backend.build(&copy)).await?;
    }

    manager
        .drop_table(Table::drop().table(Alias::new(table)).to_owned())
        .await?;
    manager
        .rename_table(
            Table::rename()
                .table(Alias::new(staging.as_str()), Alias::new(table))
                .to_owned(),
        )
        .await?;

    for column in &new.columns {
        if column.indexed {
            let name = naming.index_name(table, &column.name);
            manager
                .create_index(create_index(table, &name, &column.name, false))
                .await?;
        }
        if column.unique {
            let name = naming.unique_name(table, &column.name);
            manager
                .create_index(create_index(table, &name, &column.name, true))
                .await?;
        }
    }
    Ok(())
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::SqliteQueryBuilder;

    #[test]
    fn test_sqlite_auto_increment_key_is_column_level() {
        let table = blog_core::domain::Post::table_schema();
        let sql = create_table(&table, Some("pk_posts"), DbBackend::Sqlite)
            .to_string(SqliteQueryBuilder);

        assert!(sql.contains("PRIMARY KEY AUTOINCREMENT"), "{sql}");
        assert!(!sql.contains("CONSTRAINT \"pk_posts\""), "{sql}");
        assert!(sql.contains("\"title\" text NOT NULL"), "{sql}");
    }

    #[test]
    fn test_sqlite_plain_key_is_table_level() {
        let table = TableSchema::new("tags")
            .with_column(ColumnSchema::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnSchema::new("name", ColumnType::Text).not_null());
        let sql = create_table(&table, Some("pk_tags"), DbBackend::Sqlite)
            .to_string(SqliteQueryBuilder);

        assert!(sql.contains("CONSTRAINT \"pk_tags\" PRIMARY KEY"), "{sql}");
        assert!(!sql.contains("AUTOINCREMENT"), "{sql}");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("posts"), "\"posts\"");
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }
}
