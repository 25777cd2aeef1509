//! Admin handlers - browse, create, edit and delete posts.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Map, Value};

use blog_core::domain::{Post, PostId};
use blog_core::ports::{BaseRepository, PostRepository, SortOrder};
use blog_shared::ApiResponse;
use blog_shared::dto::{AdminIndexResponse, AdminListResponse, PostForm, PostResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub order: SortOrder,
}

/// GET /admin
pub async fn index(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(AdminIndexResponse {
        views: vec![state.admin.summary()],
        links: state.admin.links.clone(),
    })
}

/// GET /admin/posts?order=asc|desc
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let posts = state.posts.list(query.order).await?;

    let rows = posts
        .iter()
        .map(|post| row(&state, post))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(HttpResponse::Ok().json(AdminListResponse {
        view: state.admin.name.clone(),
        columns: state.admin.columns.clone(),
        total: rows.len() as u64,
        rows,
        links: state.admin.links.clone(),
    }))
}

/// GET /admin/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    let post = state.posts.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(row(&state, &post)?)))
}

/// POST /admin/posts
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let post = state.posts.save(Post::draft(form.title, form.body)).await?;

    tracing::info!(post_id = ?post.id(), "Post created via admin");
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        row(&state, &post)?,
        "Post created",
    )))
}

/// PUT /admin/posts/{id}
///
/// Replaces title and body; a field left out of the form is sent as null and
/// rejected by the store.
pub async fn update_post(
    state: web::Data<AppState>,
    path: web::Path<PostId>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let mut post = state.posts.get(path.into_inner()).await?;
    post.title = form.title;
    post.body = form.body;

    let post = state.posts.save(post).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        row(&state, &post)?,
        "Post updated",
    )))
}

/// DELETE /admin/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    state.posts.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// A stored post, projected onto the admin view's columns.
fn row(state: &AppState, post: &Post) -> AppResult<Map<String, Value>> {
    let (title, body) = post.validate()?;
    let id = post
        .id()
        .ok_or_else(|| AppError::Internal("stored post without id".to_string()))?;

    let response = PostResponse {
        id,
        created: post.created(),
        title: title.to_string(),
        body: body.to_string(),
    };
    Ok(state.admin.project(&response)?)
}
