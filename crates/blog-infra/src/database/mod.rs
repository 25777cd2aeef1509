//! Database connection management and SeaORM-backed repositories.

mod connections;

#[cfg(feature = "database")]
pub mod entity;
#[cfg(feature = "database")]
mod repository;

pub use connections::{DEFAULT_DATABASE_URL, DatabaseConfig};

#[cfg(feature = "database")]
pub use connections::Database;
#[cfg(feature = "database")]
pub use repository::SeaOrmPostRepository;
