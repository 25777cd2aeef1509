//! Schema operations - the steps a migration script is made of.

use serde::{Deserialize, Serialize};

use blog_core::schema::{ColumnSchema, SchemaSnapshot, TableSchema};

use crate::error::MigrationError;

/// A single, invertible schema change.
///
/// Every variant carries enough to build its own inverse, so a downgrade can be
/// derived from an upgrade without looking at anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SchemaOp {
    CreateTable {
        table: TableSchema,
        primary_key: Option<String>,
    },
    DropTable {
        table: TableSchema,
        primary_key: Option<String>,
    },
    AddColumn {
        table: String,
        column: ColumnSchema,
    },
    DropColumn {
        table: String,
        column: ColumnSchema,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    AlterNullability {
        table: String,
        column: String,
        nullable: bool,
    },
    CreateIndex {
        table: String,
        name: String,
        column: String,
        unique: bool,
    },
    DropIndex {
        table: String,
        name: String,
        column: String,
        unique: bool,
    },
}

impl SchemaOp {
    /// The operation that undoes this one.
    pub fn inverse(&self) -> SchemaOp {
        match self.clone() {
            SchemaOp::CreateTable { table, primary_key } => {
                SchemaOp::DropTable { table, primary_key }
            }
            SchemaOp::DropTable { table, primary_key } => {
                SchemaOp::CreateTable { table, primary_key }
            }
            SchemaOp::AddColumn { table, column } => SchemaOp::DropColumn { table, column },
            SchemaOp::DropColumn { table, column } => SchemaOp::AddColumn { table, column },
            SchemaOp::RenameColumn { table, from, to } => SchemaOp::RenameColumn {
                table,
                from: to,
                to: from,
            },
            SchemaOp::AlterNullability {
                table,
                column,
                nullable,
            } => SchemaOp::AlterNullability {
                table,
                column,
                nullable: !nullable,
            },
            SchemaOp::CreateIndex {
                table,
                name,
                column,
                unique,
            } => SchemaOp::DropIndex {
                table,
                name,
                column,
                unique,
            },
            SchemaOp::DropIndex {
                table,
                name,
                column,
                unique,
            } => SchemaOp::CreateIndex {
                table,
                name,
                column,
                unique,
            },
        }
    }

    /// Name of the table this operation touches.
    pub fn table_name(&self) -> &str {
        match self {
            SchemaOp::CreateTable { table, .. } | SchemaOp::DropTable { table, .. } => &table.name,
            SchemaOp::AddColumn { table, .. }
            | SchemaOp::DropColumn { table, .. }
            | SchemaOp::RenameColumn { table, .. }
            | SchemaOp::AlterNullability { table, .. }
            | SchemaOp::CreateIndex { table, .. }
            | SchemaOp::DropIndex { table, .. } => table,
        }
    }

    /// Replay this operation on a schema description.
    pub fn apply(&self, schema: &mut SchemaSnapshot) -> Result<(), MigrationError> {
        match self {
            SchemaOp::CreateTable { table, .. } => {
                if schema.table(&table.name).is_some() {
                    return Err(invalid(format!("table {} already exists", table.name)));
                }
                schema.insert(table.clone());
            }
            SchemaOp::DropTable { table, .. } => {
                schema
                    .remove(&table.name)
                    .ok_or_else(|| invalid(format!("table {} does not exist", table.name)))?;
            }
            SchemaOp::AddColumn { table, column } => {
                let target = table_mut(schema, table)?;
                if target.column(&column.name).is_some() {
                    return Err(invalid(format!(
                        "column {table}.{} already exists",
                        column.name
                    )));
                }
                target.columns.push(column.clone());
            }
            SchemaOp::DropColumn { table, column } => {
                let target = table_mut(schema, table)?;
                column_mut(target, &column.name)?;
                target.columns.retain(|c| c.name != column.name);
            }
            SchemaOp::RenameColumn { table, from, to } => {
                let target = table_mut(schema, table)?;
                if target.column(to).is_some() {
                    return Err(invalid(format!("column {table}.{to} already exists")));
                }
                column_mut(target, from)?.name = to.clone();
            }
            SchemaOp::AlterNullability {
                table,
                column,
                nullable,
            } => {
                column_mut(table_mut(schema, table)?, column)?.nullable = *nullable;
            }
            SchemaOp::CreateIndex {
                table,
                column,
                unique,
                ..
            } => set_index_flag(schema, table, column, *unique, true)?,
            SchemaOp::DropIndex {
                table,
                column,
                unique,
                ..
            } => set_index_flag(schema, table, column, *unique, false)?,
        }
        Ok(())
    }
}

fn invalid(msg: String) -> MigrationError {
    MigrationError::InvalidOperation(msg)
}

fn table_mut<'a>(
    schema: &'a mut SchemaSnapshot,
    name: &str,
) -> Result<&'a mut TableSchema, MigrationError> {
    schema
        .table_mut(name)
        .ok_or_else(|| invalid(format!("table {name} does not exist")))
}

fn column_mut<'a>(
    table: &'a mut TableSchema,
    name: &str,
) -> Result<&'a mut ColumnSchema, MigrationError> {
    let table_name = table.name.clone();
    table
        .column_mut(name)
        .ok_or_else(|| invalid(format!("column {table_name}.{name} does not exist")))
}

fn set_index_flag(
    schema: &mut SchemaSnapshot,
    table: &str,
    column: &str,
    unique: bool,
    value: bool,
) -> Result<(), MigrationError> {
    let column = column_mut(table_mut(schema, table)?, column)?;
    if unique {
        column.unique = value;
    } else {
        column.indexed = value;
    }
    Ok(())
}
