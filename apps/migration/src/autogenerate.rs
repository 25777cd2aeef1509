//! Script generation - diff two schema snapshots into a migration script.

use std::str::FromStr;

use sha2::{Digest, Sha256};

use blog_core::schema::{ColumnSchema, NamingConvention, SchemaSnapshot, TableSchema};

use crate::error::MigrationError;
use crate::ops::SchemaOp;
use crate::script::MigrationScript;

/// Length of a revision id, in hex characters.
const REVISION_LEN: usize = 12;

/// A column rename. Renames look like a drop plus an add in a plain diff, so
/// they have to be declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRename {
    pub table: String,
    pub from: String,
    pub to: String,
}

impl ColumnRename {
    pub fn new(table: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Parses `table.from:to`.
impl FromStr for ColumnRename {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (table, columns) = s
            .split_once('.')
            .ok_or_else(|| format!("expected table.from:to, got {s:?}"))?;
        let (from, to) = columns
            .split_once(':')
            .ok_or_else(|| format!("expected table.from:to, got {s:?}"))?;

        if [table, from, to].iter().any(|part| part.trim().is_empty()) {
            return Err(format!("expected table.from:to, got {s:?}"));
        }
        Ok(Self::new(table.trim(), from.trim(), to.trim()))
    }
}

/// Inputs to [`generate_with`] besides the two snapshots.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Revision the new script follows; `None` for the first script.
    pub parent: Option<String>,
    pub message: String,
    pub renames: Vec<ColumnRename>,
    pub naming: NamingConvention,
}

/// Diff `previous` against `current` with default options.
pub fn generate(
    previous: &SchemaSnapshot,
    current: &SchemaSnapshot,
) -> Result<MigrationScript, MigrationError> {
    generate_with(previous, current, &GenerateOptions::default())
}

/// Diff `previous` against `current`.
///
/// The output depends only on the inputs: operations come out in a fixed order
/// (dropped tables, created tables, then altered tables by name) and every
/// constraint name comes from `options.naming`. Downgrade operations are the
/// upgrade operations inverted, in reverse.
pub fn generate_with(
    previous: &SchemaSnapshot,
    current: &SchemaSnapshot,
    options: &GenerateOptions,
) -> Result<MigrationScript, MigrationError> {
    let naming = &options.naming;
    let mut upgrade = Vec::new();

    for table in previous.tables() {
        if current.table(&table.name).is_none() {
            ensure_no_renames(&table.name, &options.renames)?;
            for column in &table.columns {
                upgrade.extend(index_ops(&table.name, column, naming, false));
            }
            upgrade.push(SchemaOp::DropTable {
                table: table.clone(),
                primary_key: primary_key_name(table, naming),
            });
        }
    }

    for table in current.tables() {
        if previous.table(&table.name).is_none() {
            ensure_no_renames(&table.name, &options.renames)?;
            upgrade.push(SchemaOp::CreateTable {
                table: table.clone(),
                primary_key: primary_key_name(table, naming),
            });
            for column in &table.columns {
                upgrade.extend(index_ops(&table.name, column, naming, true));
            }
        }
    }

    for after in current.tables() {
        if let Some(before) = previous.table(&after.name) {
            let renames: Vec<&ColumnRename> = options
                .renames
                .iter()
                .filter(|r| r.table == after.name)
                .collect();
            upgrade.extend(diff_table(before, after, &renames, naming)?);
        }
    }

    let downgrade = upgrade.iter().rev().map(SchemaOp::inverse).collect();

    Ok(MigrationScript {
        revision: revision_id(options.parent.as_deref(), current)?,
        down_revision: options.parent.clone(),
        message: options.message.clone(),
        naming: naming.clone(),
        source: previous.clone(),
        target: current.clone(),
        upgrade,
        downgrade,
    })
}

/// Revision id: hash of the parent revision and the target schema.
pub(crate) fn revision_id(
    parent: Option<&str>,
    target: &SchemaSnapshot,
) -> Result<String, MigrationError> {
    let mut hasher = Sha256::new();
    hasher.update(parent.unwrap_or_default().as_bytes());
    hasher.update(b"\n");
    hasher.update(serde_json::to_vec(target)?);

    let mut id = hex::encode(hasher.finalize());
    id.truncate(REVISION_LEN);
    Ok(id)
}

fn primary_key_name(table: &TableSchema, naming: &NamingConvention) -> Option<String> {
    if table.primary_key().is_empty() {
        None
    } else {
        Some(naming.primary_key_name(&table.name))
    }
}

/// Index operations for the index flags set on `column`.
fn index_ops(
    table: &str,
    column: &ColumnSchema,
    naming: &NamingConvention,
    create: bool,
) -> Vec<SchemaOp> {
    let mut ops = Vec::new();
    let mut push = |name: String, unique: bool| {
        let (table, column) = (table.to_string(), column.name.clone());
        ops.push(if create {
            SchemaOp::CreateIndex {
                table,
                name,
                column,
                unique,
            }
        } else {
            SchemaOp::DropIndex {
                table,
                name,
                column,
                unique,
            }
        });
    };

    if column.indexed {
        push(naming.index_name(table, &column.name), false);
    }
    if column.unique {
        push(naming.unique_name(table, &column.name), true);
    }
    ops
}

fn ensure_no_renames(table: &str, renames: &[ColumnRename]) -> Result<(), MigrationError> {
    match renames.iter().find(|r| r.table == table) {
        Some(r) => Err(MigrationError::UnsupportedChange(format!(
            "rename {}.{} -> {} targets a table that is created or dropped",
            r.table, r.from, r.to
        ))),
        None => Ok(()),
    }
}

fn unsupported(table: &str, column: &str, what: &str) -> MigrationError {
    MigrationError::UnsupportedChange(format!("{table}.{column}: {what}"))
}

fn diff_table(
    before: &TableSchema,
    after: &TableSchema,
    renames: &[&ColumnRename],
    naming: &NamingConvention,
) -> Result<Vec<SchemaOp>, MigrationError> {
    let table = after.name.as_str();

    for rename in renames {
        let valid = before.column(&rename.from).is_some()
            && after.column(&rename.to).is_some()
            && before.column(&rename.to).is_none()
            && after.column(&rename.from).is_none();
        if !valid {
            return Err(unsupported(
                table,
                &rename.from,
                &format!("cannot rename to {}", rename.to),
            ));
        }
    }
    let renamed_to = |name: &str| {
        renames
            .iter()
            .find(|r| r.from == name)
            .map(|r| r.to.as_str())
    };

    let mut drop_indexes = Vec::new();
    let mut drop_columns = Vec::new();
    let mut rename_columns = Vec::new();
    let mut alter_columns = Vec::new();
    let mut add_columns = Vec::new();
    let mut create_indexes = Vec::new();

    for old in &before.columns {
        let new_name = renamed_to(&old.name);
        let Some(new) = after.column(new_name.unwrap_or(&old.name)) else {
            drop_indexes.extend(index_ops(table, old, naming, false));
            drop_columns.push(SchemaOp::DropColumn {
                table: table.to_string(),
                column: old.without_indexes(),
            });
            continue;
        };

        if old.column_type != new.column_type {
            return Err(unsupported(table, &old.name, "column type change"));
        }
        if old.primary_key != new.primary_key || old.auto_increment != new.auto_increment {
            return Err(unsupported(table, &old.name, "primary key change"));
        }

        if new_name.is_some() {
            // Index names embed the column name, so renamed columns get
            // their indexes recreated under the new name.
            drop_indexes.extend(index_ops(table, old, naming, false));
            rename_columns.push(SchemaOp::RenameColumn {
                table: table.to_string(),
                from: old.name.clone(),
                to: new.name.clone(),
            });
            create_indexes.extend(index_ops(table, new, naming, true));
        } else {
            let dropped = ColumnSchema {
                indexed: old.indexed && !new.indexed,
                unique: old.unique && !new.unique,
                ..old.clone()
            };
            let added = ColumnSchema {
                indexed: new.indexed && !old.indexed,
                unique: new.unique && !old.unique,
                ..new.clone()
            };
            drop_indexes.extend(index_ops(table, &dropped, naming, false));
            create_indexes.extend(index_ops(table, &added, naming, true));
        }

        if old.nullable != new.nullable {
            alter_columns.push(SchemaOp::AlterNullability {
                table: table.to_string(),
                column: new.name.clone(),
                nullable: new.nullable,
            });
        }
    }

    for new in &after.columns {
        let is_rename_target = renames.iter().any(|r| r.to == new.name);
        if is_rename_target || before.column(&new.name).is_some() {
            continue;
        }
        if new.primary_key {
            return Err(unsupported(table, &new.name, "adding a primary key column"));
        }
        add_columns.push(SchemaOp::AddColumn {
            table: table.to_string(),
            column: new.without_indexes(),
        });
        create_indexes.extend(index_ops(table, new, naming, true));
    }

    Ok([
        drop_indexes,
        drop_columns,
        rename_columns,
        alter_columns,
        add_columns,
        create_indexes,
    ]
    .concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_core::schema::{ColumnType, application_schema};

    fn posts_v1() -> TableSchema {
        TableSchema::new("posts")
            .with_column(
                ColumnSchema::new("id", ColumnType::Integer)
                    .primary_key()
                    .auto_increment(),
            )
            .with_column(ColumnSchema::new("created", ColumnType::Timestamp).not_null())
            .with_column(ColumnSchema::new("title", ColumnType::Text).not_null())
            .with_column(ColumnSchema::new("body", ColumnType::Text).not_null())
    }

    fn snapshot(table: TableSchema) -> SchemaSnapshot {
        SchemaSnapshot::new([table])
    }

    /// Replays `ops` on `start`.
    fn replay(start: &SchemaSnapshot, ops: &[SchemaOp]) -> SchemaSnapshot {
        let mut schema = start.clone();
        for op in ops {
            op.apply(&mut schema).unwrap();
        }
        schema
    }

    #[test]
    fn test_unchanged_schema_gives_empty_script() {
        let schema = application_schema();
        let script = generate(&schema, &schema).unwrap();

        assert!(script.is_empty());
        assert!(script.downgrade.is_empty());
    }

    #[test]
    fn test_initial_script_creates_posts() {
        let script = generate(&SchemaSnapshot::empty(), &application_schema()).unwrap();

        assert_eq!(
            script.upgrade,
            vec![SchemaOp::CreateTable {
                table: posts_v1(),
                primary_key: Some("pk_posts".to_string()),
            }]
        );
        assert_eq!(
            script.downgrade,
            vec![SchemaOp::DropTable {
                table: posts_v1(),
                primary_key: Some("pk_posts".to_string()),
            }]
        );
        assert_eq!(script.down_revision, None);
        assert_eq!(script.revision.len(), REVISION_LEN);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let previous = snapshot(posts_v1());
        let current = snapshot(
            posts_v1().with_column(ColumnSchema::new("slug", ColumnType::Text).unique()),
        );
        let options = GenerateOptions {
            parent: Some("abc123".to_string()),
            message: "add slug".to_string(),
            ..GenerateOptions::default()
        };

        let first = generate_with(&previous, &current, &options).unwrap();
        let second = generate_with(&previous, &current, &options).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        assert_eq!(first.down_revision.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_revision_depends_on_parent() {
        let schema = application_schema();
        let a = revision_id(None, &schema).unwrap();
        let b = revision_id(Some("0123456789ab"), &schema).unwrap();

        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_add_indexed_column_uses_naming_convention() {
        let previous = snapshot(posts_v1());
        let current = snapshot(
            posts_v1().with_column(
                ColumnSchema::new("slug", ColumnType::Text)
                    .indexed()
                    .unique(),
            ),
        );

        let script = generate(&previous, &current).unwrap();

        assert_eq!(
            script.upgrade,
            vec![
                SchemaOp::AddColumn {
                    table: "posts".into(),
                    column: ColumnSchema::new("slug", ColumnType::Text),
                },
                SchemaOp::CreateIndex {
                    table: "posts".into(),
                    name: "ix_slug".into(),
                    column: "slug".into(),
                    unique: false,
                },
                SchemaOp::CreateIndex {
                    table: "posts".into(),
                    name: "uq_posts_slug".into(),
                    column: "slug".into(),
                    unique: true,
                },
            ]
        );
    }

    #[test]
    fn test_drop_column_drops_its_index_first() {
        let previous = snapshot(
            posts_v1().with_column(ColumnSchema::new("slug", ColumnType::Text).indexed()),
        );
        let current = snapshot(posts_v1());

        let script = generate(&previous, &current).unwrap();

        assert!(matches!(
            script.upgrade.as_slice(),
            [
                SchemaOp::DropIndex { name, .. },
                SchemaOp::DropColumn { column, .. },
            ] if name == "ix_slug" && column.name == "slug" && !column.indexed
        ));
    }

    #[test]
    fn test_nullability_change() {
        let previous = snapshot(posts_v1());
        let mut table = posts_v1();
        table.column_mut("body").unwrap().nullable = true;
        let current = snapshot(table);

        let script = generate(&previous, &current).unwrap();

        assert_eq!(
            script.upgrade,
            vec![SchemaOp::AlterNullability {
                table: "posts".into(),
                column: "body".into(),
                nullable: true,
            }]
        );
        assert_eq!(
            script.downgrade,
            vec![SchemaOp::AlterNullability {
                table: "posts".into(),
                column: "body".into(),
                nullable: false,
            }]
        );
    }

    #[test]
    fn test_rename_requires_hint() {
        let previous = snapshot(posts_v1());
        let mut table = posts_v1();
        table.column_mut("title").unwrap().name = "headline".to_string();
        let current = snapshot(table);

        let plain = generate(&previous, &current).unwrap();
        assert!(matches!(
            plain.upgrade.as_slice(),
            [SchemaOp::DropColumn { .. }, SchemaOp::AddColumn { .. }]
        ));

        let options = GenerateOptions {
            renames: vec![ColumnRename::new("posts", "title", "headline")],
            ..GenerateOptions::default()
        };
        let hinted = generate_with(&previous, &current, &options).unwrap();
        assert_eq!(
            hinted.upgrade,
            vec![SchemaOp::RenameColumn {
                table: "posts".into(),
                from: "title".into(),
                to: "headline".into(),
            }]
        );
    }

    #[test]
    fn test_rename_hint_must_match_schemas() {
        let schema = snapshot(posts_v1());
        let options = GenerateOptions {
            renames: vec![ColumnRename::new("posts", "title", "headline")],
            ..GenerateOptions::default()
        };

        assert!(matches!(
            generate_with(&schema, &schema, &options),
            Err(MigrationError::UnsupportedChange(_))
        ));
    }

    #[test]
    fn test_type_change_is_rejected() {
        let previous = snapshot(posts_v1());
        let mut table = posts_v1();
        table.column_mut("title").unwrap().column_type = ColumnType::Integer;

        assert!(matches!(
            generate(&previous, &snapshot(table)),
            Err(MigrationError::UnsupportedChange(_))
        ));
    }

    #[test]
    fn test_replaying_scripts_reaches_both_ends() {
        let previous = snapshot(
            posts_v1().with_column(ColumnSchema::new("summary", ColumnType::Text).indexed()),
        );
        let mut table = posts_v1();
        table.column_mut("title").unwrap().name = "headline".to_string();
        table.column_mut("body").unwrap().nullable = true;
        let current = SchemaSnapshot::new([
            table.with_column(ColumnSchema::new("slug", ColumnType::Text).unique()),
            TableSchema::new("tags")
                .with_column(ColumnSchema::new("id", ColumnType::Integer).primary_key())
                .with_column(ColumnSchema::new("name", ColumnType::Text).indexed()),
        ]);
        let options = GenerateOptions {
            renames: vec![ColumnRename::new("posts", "title", "headline")],
            ..GenerateOptions::default()
        };

        let script = generate_with(&previous, &current, &options).unwrap();

        let upgraded = replay(&previous, &script.upgrade);
        assert!(generate(&upgraded, &current).unwrap().is_empty());

        let downgraded = replay(&current, &script.downgrade);
        assert!(generate(&downgraded, &previous).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rename() {
        let rename: ColumnRename = "posts.title:headline".parse().unwrap();
        assert_eq!(rename, ColumnRename::new("posts", "title", "headline"));

        assert!("posts.title".parse::<ColumnRename>().is_err());
        assert!("title:headline".parse::<ColumnRename>().is_err());
        assert!("posts.:headline".parse::<ColumnRename>().is_err());
    }
}
