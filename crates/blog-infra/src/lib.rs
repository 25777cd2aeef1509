//! # Blog Infrastructure
//!
//! Concrete implementations of the ports defined in `blog-core`.
//!
//! ## Feature Flags
//!
//! - `database` (default) - SQLite and PostgreSQL storage via SeaORM
//! - `minimal` - No external dependencies, in-memory only

pub mod database;
pub mod memory;

pub use memory::InMemoryPostRepository;

#[cfg(feature = "database")]
pub use database::{Database, DatabaseConfig, SeaOrmPostRepository};
