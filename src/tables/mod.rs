//! Access to the hosted relational store.
//!
//! The store is owned by an external service; this module only knows how to
//! insert, select and update rows of a named table with equality filters.
//! Rows travel as loose JSON objects because the live column set is not
//! under our control.

pub mod rest;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use rest::RestTableStore;

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store answered and refused the request (unknown column, constraint, ...).
    #[error("{0}")]
    Rejected(String),
    #[error("Store unreachable: {0}")]
    Transport(String),
    #[error("Unexpected store response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    pub filters: Vec<(String, String)>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter_value(&self, column: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Inserts one row and returns it as stored, server-assigned columns included.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    async fn select(&self, table: &str, query: &TableQuery) -> Result<Vec<Row>, StoreError>;

    /// Applies `patch` to every row matching `query` and returns the updated rows.
    async fn update(&self, table: &str, query: &TableQuery, patch: Row) -> Result<Vec<Row>, StoreError>;
}
