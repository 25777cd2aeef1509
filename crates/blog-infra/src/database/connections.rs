#[cfg(feature = "database")]
use std::sync::Arc;
#[cfg(feature = "database")]
use std::time::Duration;

#[cfg(feature = "database")]
use sea_orm::{ConnectOptions, ConnectionTrait, DbConn, DbErr};

/// Default store: a SQLite file next to the process, created on first use.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://blog.db?mode=rwc";

/// Configuration for the blog database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            min_connections: 1,
            sqlx_logging: true,
        }
    }
}

impl DatabaseConfig {
    /// A private in-memory SQLite database.
    ///
    /// Every pooled SQLite connection to `:memory:` opens its own database, so
    /// the pool is pinned to a single connection.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            sqlx_logging: false,
        }
    }
}

/// Pooled connection to the blog database.
///
/// Statements check a connection out of the pool and return it when they
/// finish, whether they succeed or fail. Repositories hold the pool through
/// [`Database::share`].
#[cfg(feature = "database")]
#[derive(Debug)]
pub struct Database {
    conn: Arc<DbConn>,
}

#[cfg(feature = "database")]
impl Database {
    /// Open the connection pool described by `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connection...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(config.sqlx_logging)
            .to_owned();

        let conn = sea_orm::Database::connect(opts).await?;
        tracing::info!(
            backend = ?conn.get_database_backend(),
            "Database connected (pool: {})",
            config.max_connections
        );

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Wrap an existing connection, e.g. a mock in tests.
    pub fn from_connection(conn: DbConn) -> Self {
        Self {
            conn: Arc::new(conn),
        }
    }

    pub fn connection(&self) -> &DbConn {
        &self.conn
    }

    /// A handle on the same pool.
    pub fn share(&self) -> Arc<DbConn> {
        Arc::clone(&self.conn)
    }

    /// Close the pool, waiting for checked-out connections to return.
    ///
    /// While other handles from [`Database::share`] are alive the pool stays
    /// open and is released when the last of them drops.
    pub async fn close(self) -> Result<(), DbErr> {
        match Arc::try_unwrap(self.conn) {
            Ok(conn) => {
                tracing::info!("Closing database connection");
                conn.close().await
            }
            Err(conn) => {
                tracing::warn!(
                    handles = Arc::strong_count(&conn) - 1,
                    "Database still shared, leaving the pool to the remaining handles"
                );
                Ok(())
            }
        }
    }
}
