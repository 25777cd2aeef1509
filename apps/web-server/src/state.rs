//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::PostRepository;
use blog_infra::InMemoryPostRepository;

#[cfg(feature = "database")]
use blog_infra::{Database, SeaOrmPostRepository};

use crate::admin::AdminView;
use crate::config::{AppConfig, SecretKey};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    #[cfg(feature = "database")]
    pub db: Option<Arc<Database>>,
    pub admin: Arc<AdminView>,
    pub secret_key: SecretKey,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "database")]
        let (db, posts): (Option<Arc<Database>>, Arc<dyn PostRepository>) = {
            match connect(config).await {
                Ok(db) => {
                    let repo = Arc::new(SeaOrmPostRepository::new(db.share()));
                    (Some(Arc::new(db)), repo)
                }
                Err(e) => {
                    tracing::error!("Database unavailable: {}. Using in-memory fallback.", e);
                    (None, Arc::new(InMemoryPostRepository::new()))
                }
            }
        };

        #[cfg(not(feature = "database"))]
        let posts: Arc<dyn PostRepository> = {
            tracing::info!("Running without database feature - using in-memory repository");
            Arc::new(InMemoryPostRepository::new())
        };

        tracing::info!("Application state initialized");

        Self {
            posts,
            #[cfg(feature = "database")]
            db,
            admin: Arc::new(AdminView::posts()),
            secret_key: config.secret_key.clone(),
        }
    }

    /// State backed by a fresh in-memory repository.
    pub fn in_memory(secret_key: SecretKey) -> Self {
        Self {
            posts: Arc::new(InMemoryPostRepository::new()),
            #[cfg(feature = "database")]
            db: None,
            admin: Arc::new(AdminView::posts()),
            secret_key,
        }
    }

    /// Short name of the storage in use, for health reporting.
    pub fn storage(&self) -> &'static str {
        #[cfg(feature = "database")]
        if self.db.is_some() {
            return "database";
        }
        "in-memory"
    }
}

/// Open the pool and, unless disabled, bring the schema up to head.
#[cfg(feature = "database")]
async fn connect(config: &AppConfig) -> Result<Database, Box<dyn std::error::Error + Send + Sync>> {
    let db = Database::connect(&config.database).await?;

    if config.auto_migrate {
        let outcome = migration::Migrator::embedded()?
            .upgrade(db.connection(), migration::Target::Head)
            .await?;
        tracing::info!(revision = ?outcome.to, steps = outcome.steps, "Schema migrated");
    } else {
        tracing::info!("AUTO_MIGRATE disabled - skipping schema upgrade");
    }

    Ok(db)
}
