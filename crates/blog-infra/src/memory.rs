//! In-memory post repository - used as fallback when no database is configured.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use blog_core::domain::{Post, PostId};
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, PostRepository, SortOrder};

#[derive(Default)]
struct Store {
    posts: BTreeMap<PostId, Post>,
    last_id: PostId,
}

/// In-memory repository using a BTreeMap with async RwLock.
///
/// Ids are handed out sequentially and never reused, like an auto-increment
/// column. Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryPostRepository {
    store: RwLock<Store>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Post, PostId> for InMemoryPostRepository {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store.posts.get(&id).cloned())
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        let (title, body) = entity.validate()?;
        let (title, body) = (title.to_owned(), body.to_owned());

        let mut store = self.store.write().await;
        let id = match entity.id() {
            Some(id) if store.posts.contains_key(&id) => id,
            Some(_) => return Err(RepoError::NotFound),
            None => {
                store.last_id += 1;
                store.last_id
            }
        };

        let post = Post::restore(id, entity.created(), title, body);
        store.posts.insert(id, post.clone());
        tracing::debug!(post_id = id, "Post stored in memory");

        Ok(post)
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        store
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self, order: SortOrder) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;
        let mut posts: Vec<Post> = store.posts.values().cloned().collect();

        posts.sort_by_key(|p| (p.created(), p.id()));
        if order == SortOrder::Desc {
            posts.reverse();
        }

        Ok(posts)
    }

    async fn count(&self) -> Result<u64, RepoError> {
        let store = self.store.read().await;
        Ok(store.posts.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = InMemoryPostRepository::new();
        let start = Utc::now();
        let saved = repo.save(Post::new("Hello", "World")).await.unwrap();
        let end = Utc::now();

        assert_eq!(saved.id(), Some(1));
        let fetched = repo.get(1).await.unwrap();
        assert_eq!(fetched.title.as_deref(), Some("Hello"));
        assert_eq!(fetched.body.as_deref(), Some("World"));
        assert!(fetched.created() >= start && fetched.created() <= end);
    }

    #[tokio::test]
    async fn test_null_title_is_rejected() {
        let repo = InMemoryPostRepository::new();
        let result = repo.save(Post::draft(None, Some("x".into()))).await;

        assert!(matches!(result, Err(RepoError::ConstraintViolation(_))));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_created() {
        let repo = InMemoryPostRepository::new();
        let mut post = repo.save(Post::new("Draft", "...")).await.unwrap();
        let created = post.created();

        post.title = Some("Final".to_string());
        let updated = repo.save(post).await.unwrap();

        assert_eq!(updated.id(), Some(1));
        assert_eq!(updated.created(), created);
        assert_eq!(repo.get(1).await.unwrap().title.as_deref(), Some("Final"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let repo = InMemoryPostRepository::new();
        let post = repo.save(Post::new("Hello", "World")).await.unwrap();

        repo.delete_post(&post).await.unwrap();

        assert_eq!(repo.get(1).await, Err(RepoError::NotFound));
        assert_eq!(repo.delete_post(&post).await, Err(RepoError::NotFound));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let repo = InMemoryPostRepository::new();
        let first = repo.save(Post::new("a", "a")).await.unwrap();
        repo.delete_post(&first).await.unwrap();
        let second = repo.save(Post::new("b", "b")).await.unwrap();

        assert_eq!(second.id(), Some(2));
    }

    #[tokio::test]
    async fn test_list_order_reverses_exactly() {
        let repo = InMemoryPostRepository::new();
        for i in 0..4 {
            repo.save(Post::new(format!("post {i}"), "body")).await.unwrap();
        }

        let desc = repo.list(SortOrder::Desc).await.unwrap();
        let mut asc = repo.list(SortOrder::Asc).await.unwrap();
        asc.reverse();

        assert_eq!(desc.len(), 4);
        assert_eq!(desc, asc);
        assert!(desc.windows(2).all(|w| w[0].created() >= w[1].created()));
    }
}
