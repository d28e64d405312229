//! # Generic Record Controller
//!
//! Five verbs over any registered table. Only `list` consumes a
//! [`QuerySpec`]; the other verbs address a single record by id.

use std::sync::Arc;

use serde_json::Value;

use super::accessor::{RecordId, TableAccessor, TableRegistry};
use super::errors::{RestError, RestResult};
use super::parser::QuerySpec;

/// Controller over a table registry
#[derive(Debug, Clone)]
pub struct RecordController {
    registry: Arc<TableRegistry>,
}

impl RecordController {
    pub fn new(registry: TableRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    fn accessor(&self, table: &str) -> RestResult<Arc<dyn TableAccessor>> {
        self.registry
            .resolve(table)
            .ok_or_else(|| RestError::TableNotFound(table.to_string()))
    }

    /// Fails with `TableNotFound` unless `table` is registered
    pub fn require_table(&self, table: &str) -> RestResult<()> {
        self.accessor(table).map(|_| ())
    }

    /// Records matching the query; empty when nothing matches
    pub fn list(&self, table: &str, query: &QuerySpec) -> RestResult<Vec<Value>> {
        let rows = self.accessor(table)?.find_many(query)?;
        tracing::debug!(table, rows = rows.len(), "listed records");
        Ok(rows)
    }

    pub fn get(&self, table: &str, id: &str) -> RestResult<Value> {
        self.accessor(table)?
            .find_unique(&RecordId::parse(id))?
            .ok_or(RestError::NotFound)
    }

    pub fn create(&self, table: &str, data: Value) -> RestResult<Value> {
        let record = self.accessor(table)?.create(data)?;
        tracing::debug!(table, "created record");
        Ok(record)
    }

    pub fn update(&self, table: &str, id: &str, patch: Value) -> RestResult<Value> {
        let record = self.accessor(table)?.update(&RecordId::parse(id), patch)?;
        tracing::debug!(table, id, "updated record");
        Ok(record)
    }

    pub fn delete(&self, table: &str, id: &str) -> RestResult<()> {
        self.accessor(table)?.delete(&RecordId::parse(id))?;
        tracing::debug!(table, id, "deleted record");
        Ok(())
    }
}
