//! Post entity for SeaORM.

use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;

use blog_core::domain::Post;
use blog_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub created: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Text")]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for Post {
    fn from(model: Model) -> Self {
        Post::restore(model.id, model.created.into(), model.title, model.body)
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
///
/// Unsaved posts leave the key unset so the store assigns it. For stored
/// posts the key and `created` are marked unchanged, so an update only ever
/// writes `title` and `body`.
impl TryFrom<Post> for ActiveModel {
    type Error = RepoError;

    fn try_from(post: Post) -> Result<Self, Self::Error> {
        let (title, body) = post.validate()?;
        let (title, body) = (title.to_owned(), body.to_owned());
        let created: DateTimeWithTimeZone = post.created().into();

        Ok(match post.id() {
            Some(id) => Self {
                id: Unchanged(id),
                created: Unchanged(created),
                title: Set(title),
                body: Set(body),
            },
            None => Self {
                id: NotSet,
                created: Set(created),
                title: Set(title),
                body: Set(body),
            },
        })
    }
}
