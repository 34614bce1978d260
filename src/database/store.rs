use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: String },
    /// Case-insensitive substring match of `value` in `column`.
    ILike { column: String, value: String },
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<String>) -> Self {
        Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn ilike(column: &str, value: impl Into<String>) -> Self {
        Filter::ILike {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::ILike { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Select {
    pub filters: Vec<Filter>,
    /// Ascending sort keys, applied in order.
    pub order_by: Vec<String>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order_by.push(column.to_string());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Generic verbs over a remote table. Rows travel as JSON objects keyed by
/// column name; repositories own the typed view of each table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn select(&self, table: &str, query: &Select) -> Result<Vec<Value>, StoreError>;

    /// Inserts one row and returns it as stored.
    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError>;

    /// Applies `changes` to every row matching `filter`; returns the updated rows.
    async fn update(
        &self,
        table: &str,
        changes: Value,
        filter: &Filter,
    ) -> Result<Vec<Value>, StoreError>;

    /// Deletes every row matching `filter`; returns how many went away.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64, StoreError>;
}
