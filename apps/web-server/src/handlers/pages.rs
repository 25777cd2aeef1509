//! Static pages.

use actix_web::HttpResponse;
use actix_web::http::header::ContentType;

const HOME: &str = include_str!("../../templates/home.html");
const REGISTRATION: &str = include_str!("../../templates/registration.html");

/// GET /
pub async fn home() -> HttpResponse {
    html(HOME)
}

/// GET /registration
pub async fn registration() -> HttpResponse {
    html(REGISTRATION)
}

fn html(page: &'static str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(page)
}
