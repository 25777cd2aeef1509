//! HTTP handlers and route configuration.

mod admin;
mod health;
mod pages;

use actix_web::error::{InternalError, JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};
use blog_shared::ErrorResponse;

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/", web::get().to(pages::home))
        .route("/registration", web::get().to(pages::registration))
        .service(web::scope("/api").route("/health", web::get().to(health::health_check)))
        .service(
            web::scope("/admin")
                .route("", web::get().to(admin::index))
                .route("/posts", web::get().to(admin::list_posts))
                .route("/posts", web::post().to(admin::create_post))
                .route("/posts/{id}", web::get().to(admin::get_post))
                .route("/posts/{id}", web::put().to(admin::update_post))
                .route("/posts/{id}", web::delete().to(admin::delete_post)),
        );
}

/// Malformed JSON bodies become problem responses naming the request path.
fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let problem = ErrorResponse::bad_request(err.to_string()).with_instance(req.path());
    InternalError::from_response(err, HttpResponse::BadRequest().json(problem)).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}
