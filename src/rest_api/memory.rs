//! # In-Memory Table
//!
//! Reference [`TableAccessor`] that keeps JSON records in insertion order
//! and evaluates a [`QuerySpec`] against them.

use std::cmp::Ordering;
use std::sync::RwLock;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::accessor::{AccessError, AccessResult, RecordId, TableAccessor};
use super::parser::{QuerySpec, Selection};

/// Primary key column
pub const ID_FIELD: &str = "id";

/// In-memory table of JSON records
#[derive(Debug, Default)]
pub struct MemoryTable {
    rows: RwLock<Vec<Value>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from existing rows, stored as given
    pub fn with_rows(rows: Vec<Value>) -> AccessResult<Self> {
        let table = Self::new();
        for row in rows {
            table.create(row)?;
        }
        Ok(table)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    fn now() -> Value {
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Apply ordering
    fn apply_ordering(records: &mut [Value], query: &QuerySpec) {
        let Some(order) = &query.order else {
            return;
        };

        records.sort_by(|a, b| {
            let cmp = match (a.get(&order.field), b.get(&order.field)) {
                (Some(x), Some(y)) if !x.is_null() && !y.is_null() => {
                    order_values(x, y)
                }
                // missing values go last in ascending order
                (Some(x), _) if !x.is_null() => Ordering::Less,
                (_, Some(y)) if !y.is_null() => Ordering::Greater,
                _ => Ordering::Equal,
            };
            if order.ascending() {
                cmp
            } else {
                cmp.reverse()
            }
        });
    }

    /// Apply pagination
    fn apply_pagination(records: Vec<Value>, query: &QuerySpec) -> Vec<Value> {
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        records.into_iter().skip(offset).take(limit).collect()
    }

    /// Select fields from records
    fn select_fields(records: Vec<Value>, query: &QuerySpec) -> Vec<Value> {
        match &query.select {
            Selection::All => records,
            Selection::Fields(fields) => records
                .into_iter()
                .map(|record| match record {
                    Value::Object(obj) => Value::Object(
                        obj.into_iter()
                            .filter(|(k, _)| fields.contains(k))
                            .collect::<Map<String, Value>>(),
                    ),
                    other => other,
                })
                .collect(),
        }
    }
}

fn poisoned<T>(_: T) -> AccessError {
    AccessError::LockPoisoned("memory table".to_string())
}

fn row_id(row: &Value) -> Option<&Value> {
    row.get(ID_FIELD)
}

/// Rank of a JSON type in sort order: booleans, numbers, strings, arrays, objects
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over non-null JSON values; mixed types sort by type rank
fn order_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => x.to_string().cmp(&y.to_string()),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

impl TableAccessor for MemoryTable {
    fn find_many(&self, query: &QuerySpec) -> AccessResult<Vec<Value>> {
        let rows = self.rows.read().map_err(poisoned)?;

        let mut matched: Vec<Value> = rows
            .iter()
            .filter(|r| query.filter.matches(r))
            .cloned()
            .collect();
        drop(rows);

        Self::apply_ordering(&mut matched, query);
        let page = Self::apply_pagination(matched, query);
        Ok(Self::select_fields(page, query))
    }

    fn find_unique(&self, id: &RecordId) -> AccessResult<Option<Value>> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows
            .iter()
            .find(|r| row_id(r).is_some_and(|v| id.matches(v)))
            .cloned())
    }

    fn create(&self, data: Value) -> AccessResult<Value> {
        let Value::Object(mut obj) = data else {
            return Err(AccessError::InvalidRecord(
                "record must be a JSON object".to_string(),
            ));
        };

        obj.entry(ID_FIELD)
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        obj.entry("created_at").or_insert_with(Self::now);

        let mut rows = self.rows.write().map_err(poisoned)?;
        let id = obj.get(ID_FIELD).cloned().unwrap_or(Value::Null);
        if rows.iter().any(|r| row_id(r) == Some(&id)) {
            return Err(AccessError::Conflict(format!("{}={}", ID_FIELD, id)));
        }

        let record = Value::Object(obj);
        rows.push(record.clone());
        Ok(record)
    }

    fn update(&self, id: &RecordId, patch: Value) -> AccessResult<Value> {
        let Value::Object(patch) = patch else {
            return Err(AccessError::InvalidRecord(
                "update must be a JSON object".to_string(),
            ));
        };

        let mut rows = self.rows.write().map_err(poisoned)?;
        let record = rows
            .iter_mut()
            .find(|r| row_id(r).is_some_and(|v| id.matches(v)))
            .ok_or(AccessError::RecordNotFound)?;

        if let Some(obj) = record.as_object_mut() {
            for (key, value) in patch {
                // the primary key is immutable
                if key != ID_FIELD {
                    obj.insert(key, value);
                }
            }
            obj.insert("updated_at".to_string(), Self::now());
        }

        Ok(record.clone())
    }

    fn delete(&self, id: &RecordId) -> AccessResult<()> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        let idx = rows
            .iter()
            .position(|r| row_id(r).is_some_and(|v| id.matches(v)))
            .ok_or(AccessError::RecordNotFound)?;
        rows.remove(idx);
        Ok(())
    }
}
