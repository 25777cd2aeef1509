use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Post, PostId};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update), returning the stored version.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Direction of the `created` ordering used by [`PostRepository::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn reverse(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, PostId> {
    /// All posts ordered by `created`, ties broken by `id` in the same
    /// direction.
    async fn list(&self, order: SortOrder) -> Result<Vec<Post>, RepoError>;

    /// Number of stored posts.
    async fn count(&self) -> Result<u64, RepoError>;

    /// Fetch a post, failing with [`RepoError::NotFound`] when it is absent.
    async fn get(&self, id: PostId) -> Result<Post, RepoError> {
        self.find_by_id(id).await?.ok_or(RepoError::NotFound)
    }

    /// Remove a stored post. Posts that were never saved are not found.
    async fn delete_post(&self, post: &Post) -> Result<(), RepoError> {
        let id = post.id().ok_or(RepoError::NotFound)?;
        self.delete(id).await
    }
}
