//! # Table Accessors
//!
//! The data-access seam of the REST layer. Each registered table is bound
//! to a [`TableAccessor`]; the [`TableRegistry`] resolves table names to
//! accessors and is populated once at process start.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::parser::QuerySpec;

/// Result type for accessor operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Accessor errors
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// Update or delete targeted a row that does not exist
    #[error("Record not found")]
    RecordNotFound,

    /// Payload is not a storable record
    #[error("{0}")]
    InvalidRecord(String),

    /// Unique key collision
    #[error("Duplicate key: {0}")]
    Conflict(String),

    /// Store lock poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// Backend-specific failure
    #[error("{0}")]
    Backend(String),
}

/// Primary key taken from the request path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Numeric when the whole string is an integer, otherwise text
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Text(raw.to_string()),
        }
    }

    /// Check whether a stored `id` value is this key
    pub fn matches(&self, stored: &Value) -> bool {
        match (self, stored) {
            (RecordId::Int(n), Value::Number(v)) => v.as_i64() == Some(*n),
            (RecordId::Text(s), Value::String(v)) => s == v,
            _ => false,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Uniform operations over one named table
pub trait TableAccessor: Send + Sync {
    /// All records matching the query, ordered, paginated and projected
    fn find_many(&self, query: &QuerySpec) -> AccessResult<Vec<Value>>;

    /// Record by primary key, `None` when absent
    fn find_unique(&self, id: &RecordId) -> AccessResult<Option<Value>>;

    /// Insert a record and return it as stored
    fn create(&self, data: Value) -> AccessResult<Value>;

    /// Merge a partial record into an existing one
    fn update(&self, id: &RecordId, patch: Value) -> AccessResult<Value>;

    /// Remove a record
    fn delete(&self, id: &RecordId) -> AccessResult<()>;
}

/// Table name to accessor mapping
#[derive(Default, Clone)]
pub struct TableRegistry {
    tables: BTreeMap<String, Arc<dyn TableAccessor>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an accessor to a table name, replacing any previous binding
    pub fn register(&mut self, name: impl Into<String>, accessor: Arc<dyn TableAccessor>) {
        self.tables.insert(name.into(), accessor);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_table(mut self, name: impl Into<String>, accessor: Arc<dyn TableAccessor>) -> Self {
        self.register(name, accessor);
        self
    }

    /// Accessor for a table, `None` if the name is not registered
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn TableAccessor>> {
        self.tables.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

impl fmt::Debug for TableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRegistry")
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .finish()
    }
}
