//! Data Transfer Objects - request/response types for the admin surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Submitted post fields. A missing field is sent on as a null column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// A stored post as shown by the admin surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i32,
    pub created: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

/// A navigation link rendered next to an admin view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub label: String,
    pub url: String,
}

/// Entry of the admin index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminViewSummary {
    pub name: String,
    pub url: String,
}

/// Admin index: the registered views and the outbound links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminIndexResponse {
    pub views: Vec<AdminViewSummary>,
    pub links: Vec<NavLink>,
}

/// One page of an admin record browser.
///
/// Each row only carries the columns listed in `columns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminListResponse {
    pub view: String,
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub total: u64,
    pub links: Vec<NavLink>,
}
