//! # Blog Shared
//!
//! Types exchanged over the admin surface.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
