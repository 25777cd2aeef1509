//! SeaORM repository implementations.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DbConn, DbErr, EntityTrait, Order, PaginatorTrait, QueryOrder, SqlErr,
};

use blog_core::domain::{Post, PostId};
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, PostRepository, SortOrder};

use super::entity::post::{self, Entity as PostEntity};

/// Post repository backed by SeaORM (SQLite or PostgreSQL).
#[derive(Debug)]
pub struct SeaOrmPostRepository {
    pub(crate) db: Arc<DbConn>,
}

impl SeaOrmPostRepository {
    /// Accepts an owned connection or a handle from [`Database::share`].
    ///
    /// [`Database::share`]: super::Database::share
    pub fn new(db: impl Into<Arc<DbConn>>) -> Self {
        Self { db: db.into() }
    }
}

/// Translate a SeaORM error into the repository taxonomy.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    if let Some(SqlErr::UniqueConstraintViolation(msg)) = err.sql_err() {
        return RepoError::ConstraintViolation(msg);
    }

    match err {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        DbErr::ConnectionAcquire(e) => RepoError::Connection(e.to_string()),
        other => {
            let msg = other.to_string();
            if msg.contains("NOT NULL") || msg.contains("not-null") {
                RepoError::ConstraintViolation(msg)
            } else {
                RepoError::Query(msg)
            }
        }
    }
}

#[async_trait]
impl BaseRepository<Post, PostId> for SeaOrmPostRepository {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        let is_new = !entity.is_persisted();
        let active_model = post::ActiveModel::try_from(entity).inspect_err(|e| {
            tracing::debug!(error = %e, "Rejected post before writing");
        })?;

        let model = if is_new {
            active_model.insert(self.db.as_ref()).await
        } else {
            active_model.update(self.db.as_ref()).await
        }
        .map_err(map_db_err)?;

        if is_new {
            tracing::info!(post_id = model.id, "Post created");
        } else {
            tracing::info!(post_id = model.id, "Post updated");
        }

        Ok(model.into())
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }
}

#[async_trait]
impl PostRepository for SeaOrmPostRepository {
    async fn list(&self, order: SortOrder) -> Result<Vec<Post>, RepoError> {
        let order = match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let result = PostEntity::find()
            .order_by(post::Column::Created, order.clone())
            .order_by(post::Column::Id, order)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        PostEntity::find().count(self.db.as_ref()).await.map_err(map_db_err)
    }
}
