//! Migrations against a live in-memory SQLite database.

use std::sync::Arc;

use sea_orm::DbConn;
use sea_orm_migration::SchemaManager;

use blog_core::domain::Post;
use blog_core::ports::{BaseRepository, PostRepository};
use blog_core::schema::{ColumnSchema, ColumnType, SchemaSnapshot, TableSchema, application_schema};
use blog_infra::{Database, DatabaseConfig, SeaOrmPostRepository};
use migration::{
    GenerateOptions, MigrationError, MigrationScript, Migrator, REVISION_TABLE, SchemaOp, Target,
    generate_with,
};

async fn connect() -> Arc<DbConn> {
    Database::connect(&DatabaseConfig::in_memory())
        .await
        .expect("in-memory sqlite")
        .share()
}

async fn has_table(db: &DbConn, table: &str) -> bool {
    SchemaManager::new(db).has_table(table).await.unwrap()
}

/// The embedded history plus a script that makes `posts.body` nullable and
/// adds an indexed `summary` column.
fn extended_history() -> Migrator {
    let embedded = Migrator::embedded().unwrap();

    let mut posts = Post::table_schema();
    posts.column_mut("body").unwrap().nullable = true;
    let posts = posts.with_column(ColumnSchema::new("summary", ColumnType::Text).indexed());
    let options = GenerateOptions {
        message: "optional body".to_string(),
        ..GenerateOptions::default()
    };
    let second = embedded
        .generate(&SchemaSnapshot::new([posts]), options)
        .unwrap();

    let mut scripts = embedded.history().to_vec();
    scripts.push(second);
    Migrator::new(scripts).unwrap()
}

#[tokio::test]
async fn test_upgrade_creates_posts_for_the_repository() {
    let db = connect().await;
    let migrator = Migrator::embedded().unwrap();

    let outcome = migrator.upgrade(&db, Target::Head).await.unwrap();
    assert_eq!(outcome.from, None);
    assert_eq!(outcome.to.as_deref(), migrator.head());
    assert_eq!(outcome.steps, 1);

    let repo = SeaOrmPostRepository::new(Arc::clone(&db));
    let saved = repo.save(Post::new("Hello", "World")).await.unwrap();
    let fetched = repo.get(saved.id().unwrap()).await.unwrap();
    assert_eq!(fetched.title.as_deref(), Some("Hello"));
    assert_eq!(fetched.body.as_deref(), Some("World"));

    assert_eq!(
        migrator.current(&db).await.unwrap().as_deref(),
        migrator.head()
    );
}

#[tokio::test]
async fn test_current_does_not_create_the_marker() {
    let db = connect().await;

    assert_eq!(Migrator::embedded().unwrap().current(&db).await.unwrap(), None);
    assert!(!has_table(&db, REVISION_TABLE).await);
}

#[tokio::test]
async fn test_upgrade_and_downgrade_are_idempotent() {
    let db = connect().await;
    let migrator = Migrator::embedded().unwrap();

    migrator.upgrade(&db, Target::Head).await.unwrap();
    assert!(migrator.upgrade(&db, Target::Head).await.unwrap().is_noop());

    let script = &migrator.history()[0];
    assert!(script.upgrade(&db).await.unwrap().is_noop());

    let outcome = migrator.downgrade(&db, Target::Base).await.unwrap();
    assert_eq!(outcome.to, None);
    assert!(!has_table(&db, "posts").await);
    assert!(migrator.downgrade(&db, Target::Base).await.unwrap().is_noop());
    assert!(script.downgrade(&db).await.unwrap().is_noop());
    assert_eq!(migrator.current(&db).await.unwrap(), None);
}

#[tokio::test]
async fn test_script_applies_only_from_its_parent() {
    let db = connect().await;
    let migrator = extended_history();
    let second = &migrator.history()[1];

    let result = second.upgrade(&db).await;

    assert!(matches!(result, Err(MigrationError::SchemaMismatch { .. })));
    assert!(!has_table(&db, "posts").await);
    assert_eq!(migrator.current(&db).await.unwrap(), None);
}

#[tokio::test]
async fn test_moving_the_wrong_way_is_a_mismatch() {
    let db = connect().await;
    let migrator = extended_history();
    let first = migrator.history()[0].revision.clone();

    assert!(matches!(
        migrator.downgrade(&db, Target::Revision(first.clone())).await,
        Err(MigrationError::SchemaMismatch { .. })
    ));

    migrator.upgrade(&db, Target::Head).await.unwrap();
    assert!(matches!(
        migrator.upgrade(&db, Target::Revision(first)).await,
        Err(MigrationError::SchemaMismatch { .. })
    ));
}

#[tokio::test]
async fn test_unknown_live_revision_is_a_mismatch() {
    let db = connect().await;
    extended_history().upgrade(&db, Target::Head).await.unwrap();

    let result = Migrator::embedded().unwrap().upgrade(&db, Target::Head).await;

    assert!(matches!(result, Err(MigrationError::SchemaMismatch { .. })));
}

#[tokio::test]
async fn test_failed_step_leaves_no_partial_change() {
    let db = connect().await;
    let tags = TableSchema::new("tags")
        .with_column(ColumnSchema::new("id", ColumnType::Integer).primary_key())
        .with_column(ColumnSchema::new("name", ColumnType::Text).not_null());
    let create_tags = SchemaOp::CreateTable {
        table: tags.clone(),
        primary_key: Some("pk_tags".to_string()),
    };
    let broken = SchemaOp::DropColumn {
        table: "posts".to_string(),
        column: ColumnSchema::new("missing", ColumnType::Text),
    };
    let script = MigrationScript {
        upgrade: vec![create_tags, broken],
        ..generate_with(
            &SchemaSnapshot::empty(),
            &SchemaSnapshot::new([tags]),
            &GenerateOptions::default(),
        )
        .unwrap()
    };

    let result = script.upgrade(&db).await;

    assert!(matches!(result, Err(MigrationError::InvalidOperation(_))));
    assert!(!has_table(&db, "tags").await);
    assert_eq!(Migrator::default().current(&db).await.unwrap(), None);
}

#[tokio::test]
async fn test_sqlite_rebuild_keeps_rows() {
    let db = connect().await;
    let migrator = extended_history();
    let first = migrator.history()[0].revision.clone();
    let repo = SeaOrmPostRepository::new(Arc::clone(&db));

    migrator.upgrade(&db, Target::Revision(first.clone())).await.unwrap();
    let saved = repo.save(Post::new("Kept", "across rebuilds")).await.unwrap();
    let id = saved.id().unwrap();

    let outcome = migrator.upgrade(&db, Target::Head).await.unwrap();
    assert_eq!(outcome.steps, 1);

    let manager = SchemaManager::new(db.as_ref());
    assert!(manager.has_column("posts", "summary").await.unwrap());
    assert!(manager.has_index("posts", "ix_summary").await.unwrap());
    assert!(!has_table(&db, "_posts_rebuild").await);
    assert_eq!(repo.get(id).await.unwrap(), saved);

    migrator.downgrade(&db, Target::Revision(first)).await.unwrap();

    assert!(!manager.has_column("posts", "summary").await.unwrap());
    assert_eq!(repo.get(id).await.unwrap(), saved);
    assert_eq!(repo.count().await.unwrap(), 1);

    let next = repo.save(Post::new("After", "downgrade")).await.unwrap();
    assert_eq!(next.id(), Some(id + 1));
}

#[tokio::test]
async fn test_migrated_posts_never_reuse_ids() {
    let db = connect().await;
    Migrator::embedded()
        .unwrap()
        .upgrade(&db, Target::Head)
        .await
        .unwrap();
    let repo = SeaOrmPostRepository::new(Arc::clone(&db));

    let first = repo.save(Post::new("First", "body")).await.unwrap();
    repo.delete(first.id().unwrap()).await.unwrap();
    let second = repo.save(Post::new("Second", "body")).await.unwrap();

    assert_eq!(first.id(), Some(1));
    assert_eq!(second.id(), Some(2));
}

#[tokio::test]
async fn test_head_matches_application_schema() {
    let migrator = Migrator::embedded().unwrap();

    assert!(migrator.check(&application_schema()).unwrap());
    assert!(!extended_history().check(&application_schema()).unwrap());
}
