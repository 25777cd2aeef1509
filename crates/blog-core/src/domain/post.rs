use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::RepoError;
use crate::schema::{ColumnSchema, ColumnType, TableSchema};

/// Primary key type of the `posts` table.
pub type PostId = i32;

/// Post entity - a single blog post.
///
/// `id` and `created` are read-only: the id is handed out by the storage layer
/// on first save, and the creation instant is taken from the clock when the
/// record is constructed. `title` and `body` are mutated by plain assignment
/// followed by a save; `None` stands for an unset column and is rejected by
/// [`Post::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    id: Option<PostId>,
    created: DateTime<Utc>,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl Post {
    /// Name of the backing table.
    pub const TABLE: &'static str = "posts";

    /// Create a new, unsaved post.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::draft(Some(title.into()), Some(body.into()))
    }

    /// Create an unsaved post whose fields may still be missing, as they
    /// arrive from a submitted form.
    pub fn draft(title: Option<String>, body: Option<String>) -> Self {
        Self {
            id: None,
            created: Utc::now(),
            title,
            body,
        }
    }

    /// Rebuild a stored post. Only storage implementations should call this.
    pub fn restore(id: PostId, created: DateTime<Utc>, title: String, body: String) -> Self {
        Self {
            id: Some(id),
            created,
            title: Some(title),
            body: Some(body),
        }
    }

    pub fn id(&self) -> Option<PostId> {
        self.id
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Check the NOT NULL columns, returning the title and body on success.
    pub fn validate(&self) -> Result<(&str, &str), RepoError> {
        let title = self
            .title
            .as_deref()
            .ok_or_else(|| RepoError::not_null(Self::TABLE, "title"))?;
        let body = self
            .body
            .as_deref()
            .ok_or_else(|| RepoError::not_null(Self::TABLE, "body"))?;
        Ok((title, body))
    }

    /// Schema descriptor of the `posts` table.
    pub fn table_schema() -> TableSchema {
        TableSchema::new(Self::TABLE)
            .with_column(
                ColumnSchema::new("id", ColumnType::Integer)
                    .primary_key()
                    .auto_increment(),
            )
            .with_column(ColumnSchema::new("created", ColumnType::Timestamp).not_null())
            .with_column(ColumnSchema::new("title", ColumnType::Text).not_null())
            .with_column(ColumnSchema::new("body", ColumnType::Text).not_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_is_unsaved_and_stamped() {
        let before = Utc::now();
        let post = Post::new("Hello", "World");
        let after = Utc::now();

        assert_eq!(post.id(), None);
        assert!(!post.is_persisted());
        assert!(post.created() >= before && post.created() <= after);
        assert_eq!(post.title.as_deref(), Some("Hello"));
        assert_eq!(post.body.as_deref(), Some("World"));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut post = Post::new("Hello", "World");
        assert_eq!(post.validate(), Ok(("Hello", "World")));

        post.title = None;
        assert!(matches!(
            post.validate(),
            Err(RepoError::ConstraintViolation(msg)) if msg.contains("posts.title")
        ));

        let post = Post::draft(Some("x".into()), None);
        assert!(matches!(
            post.validate(),
            Err(RepoError::ConstraintViolation(msg)) if msg.contains("posts.body")
        ));
    }

    #[test]
    fn test_empty_strings_are_valid() {
        let post = Post::new("", "");
        assert!(post.validate().is_ok());
    }

    #[test]
    fn test_table_schema_matches_record() {
        let schema = Post::table_schema();
        let names: Vec<_> = schema.columns.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(schema.name, "posts");
        assert_eq!(names, ["id", "created", "title", "body"]);
        assert_eq!(schema.primary_key(), ["id"]);
        assert!(schema.columns.iter().all(|c| !c.nullable));
    }
}
