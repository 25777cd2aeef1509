//! Admin views: which records a browser page shows, which columns, and
//! where its navigation links point.

use serde::Serialize;
use serde_json::{Map, Value};

use blog_shared::dto::{AdminViewSummary, NavLink};

/// One record browser in the admin surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminView {
    pub name: String,
    pub endpoint: String,
    /// Fields shown for every record, in display order.
    pub columns: Vec<String>,
    pub links: Vec<NavLink>,
}

impl AdminView {
    pub fn new<I, S>(name: impl Into<String>, endpoint: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            links: Vec::new(),
        }
    }

    pub fn with_link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.links.push(NavLink {
            label: label.into(),
            url: url.into(),
        });
        self
    }

    /// The post browser, linking back to the home page.
    pub fn posts() -> Self {
        Self::new("Posts", "/admin/posts", ["id", "created", "title", "body"]).with_link("Home", "/")
    }

    pub fn summary(&self) -> AdminViewSummary {
        AdminViewSummary {
            name: self.name.clone(),
            url: self.endpoint.clone(),
        }
    }

    /// Keep only the configured columns of `record`. Columns the record lacks
    /// come out as `null`.
    pub fn project<T: Serialize>(&self, record: &T) -> Result<Map<String, Value>, serde_json::Error> {
        let mut fields = match serde_json::to_value(record)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };

        Ok(self
            .columns
            .iter()
            .map(|column| {
                let value = fields.remove(column).unwrap_or(Value::Null);
                (column.clone(), value)
            })
            .collect())
    }
}
