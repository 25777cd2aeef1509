//! Schema descriptors.
//!
//! Plain, serialisable descriptions of the tables the application owns. The
//! migration tooling diffs two [`SchemaSnapshot`]s to produce a script; the
//! storage layer never reads these at runtime.

mod naming;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Post;

pub use naming::NamingConvention;

/// Logical column types understood by the migration tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Text,
    Timestamp,
}

/// A single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub indexed: bool,
}

impl ColumnSchema {
    /// A nullable column with no constraints.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            unique: false,
            indexed: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// The same column with its index flags cleared.
    pub fn without_indexes(&self) -> Self {
        Self {
            unique: false,
            indexed: false,
            ..self.clone()
        }
    }
}

/// A table: a name and its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnSchema> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Names of the primary key columns, in declaration order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// The full set of tables at one point in the schema's history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaSnapshot {
    /// The schema of an empty database.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(tables: impl IntoIterator<Item = TableSchema>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableSchema> {
        self.tables.get_mut(name)
    }

    /// Tables ordered by name.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    /// Insert a table, returning the one it replaced.
    pub fn insert(&mut self, table: TableSchema) -> Option<TableSchema> {
        self.tables.insert(table.name.clone(), table)
    }

    pub fn remove(&mut self, name: &str) -> Option<TableSchema> {
        self.tables.remove(name)
    }
}

/// Every table the application currently declares.
pub fn application_schema() -> SchemaSnapshot {
    SchemaSnapshot::new([Post::table_schema()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_orders_tables_by_name() {
        let snapshot = SchemaSnapshot::new([TableSchema::new("zeta"), TableSchema::new("alpha")]);
        let names: Vec<_> = snapshot.tables().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn test_serialization_is_stable() {
        let first = serde_json::to_string(&application_schema()).unwrap();
        let second = serde_json::to_string(&application_schema()).unwrap();
        assert_eq!(first, second);

        let parsed: SchemaSnapshot = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed, application_schema());
    }

    #[test]
    fn test_column_builder() {
        let column = ColumnSchema::new("slug", ColumnType::Text)
            .not_null()
            .unique()
            .indexed();
        assert!(!column.nullable);

        let stripped = column.without_indexes();
        assert!(!stripped.unique && !stripped.indexed);
        assert_eq!(stripped.name, "slug");
    }
}
