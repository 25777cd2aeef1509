//! # Blog Core
//!
//! The domain layer of the blog.
//! This crate contains the Post record, the schema descriptors the migration
//! tooling works from, and the repository ports. It has no infrastructure
//! dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod schema;

pub use domain::{Post, PostId};
pub use error::RepoError;
