//! # Filter Expression AST
//!
//! Represents the filter conditions extracted from a REST query string,
//! and evaluates them against JSON records.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equals
    #[serde(rename = "eq")]
    Eq,

    /// Greater than
    #[serde(rename = "gt")]
    Gt,

    /// Greater than or equal
    #[serde(rename = "gte")]
    Gte,

    /// Less than
    #[serde(rename = "lt")]
    Lt,

    /// Less than or equal
    #[serde(rename = "lte")]
    Lte,

    /// Case-insensitive substring match
    #[serde(rename = "ilike")]
    ILike,

    /// Value in list
    #[serde(rename = "in")]
    In,
}

impl FilterOperator {
    /// Look up a range operator by name
    pub fn range(name: &str) -> Option<Self> {
        match name {
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "lt" => Some(FilterOperator::Lt),
            "lte" => Some(FilterOperator::Lte),
            _ => None,
        }
    }
}

/// A filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Field to filter on
    pub field: String,

    /// Comparison operator
    pub operator: FilterOperator,

    /// Value to compare against
    pub value: Value,
}

impl FilterExpr {
    /// Create a new filter expression
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Create a case-insensitive "contains" filter
    pub fn ilike(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::ILike, Value::String(needle.into()))
    }

    /// Create an "in list" filter; members are kept as strings
    pub fn in_list<I, S>(field: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = members
            .into_iter()
            .map(|m| Value::String(m.into()))
            .collect();
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Check if a record matches this filter
    ///
    /// A record without the field never matches.
    pub fn matches(&self, record: &Value) -> bool {
        let field_value = match record.get(&self.field) {
            Some(v) if !v.is_null() => v,
            _ => return false,
        };

        match self.operator {
            FilterOperator::Eq => json_equals(field_value, &self.value),
            FilterOperator::Gt => compare_json_values(field_value, &self.value) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                compare_json_values(field_value, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt => compare_json_values(field_value, &self.value) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                compare_json_values(field_value, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::ILike => match (field_value.as_str(), self.value.as_str()) {
                (Some(haystack), Some(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
            FilterOperator::In => {
                let text = match json_text(field_value) {
                    Some(t) => t,
                    None => return false,
                };
                self.value
                    .as_array()
                    .map(|members| members.iter().any(|m| m.as_str() == Some(text.as_str())))
                    .unwrap_or(false)
            }
        }
    }
}

/// Equality that treats `1` and `1.0` as the same number
fn json_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Compare two JSON values for ordering
///
/// Only number/number and string/string pairs are comparable.
fn compare_json_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Textual form of a scalar, as a database would cast it for `IN ('a','b')`
fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Top-level filters combined with AND, plus an optional OR-group that
/// acts as one more conjunct.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSet {
    pub filters: Vec<FilterExpr>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub or_group: Option<Vec<FilterExpr>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn or(mut self, clauses: Vec<FilterExpr>) -> Self {
        self.or_group = Some(clauses);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.or_group.as_ref().map_or(true, |g| g.is_empty())
    }

    /// Check if a record matches all filters and at least one OR clause
    pub fn matches(&self, record: &Value) -> bool {
        if !self.filters.iter().all(|f| f.matches(record)) {
            return false;
        }
        match &self.or_group {
            Some(group) if !group.is_empty() => group.iter().any(|f| f.matches(record)),
            _ => true,
        }
    }
}
