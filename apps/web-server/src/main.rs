//! # Blog Web Server
//!
//! The main entry point for the Actix-web HTTP server.

#[cfg(feature = "database")]
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod admin;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!("Starting blog server on {}:{}", config.host, config.port);

    let state = AppState::new(&config).await;
    let server_state = state.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(server_state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    #[cfg(feature = "database")]
    {
        let AppState { posts, db, .. } = state;
        drop(posts);
        if let Some(db) = db.and_then(Arc::into_inner) {
            if let Err(e) = db.close().await {
                tracing::warn!("Failed to close database pool: {}", e);
            }
        }
    }

    Ok(())
}
