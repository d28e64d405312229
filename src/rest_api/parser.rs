//! # Query Parameter Parser
//!
//! Translates PostgREST-style query parameters into a [`QuerySpec`].
//!
//! ```text
//! select=<field1,field2,...>|*
//! <field>=eq.<v> | gte.<v> | lte.<v> | ilike.*<v>* | in.(<v1>,<v2>,...)
//! or=(<field>.<op>.<value>,...)        op ∈ {eq,ilike,in,gt,gte,lt,lte}
//! order=<field>.<asc|desc>
//! limit=<integer>
//! offset=<integer>
//! ```
//!
//! Translation is pure. Every parameter is first classified, every filter
//! fragment parses to `Result<FilterExpr, ClauseError>`, and the
//! [`ParseMode`] decides whether a malformed fragment is dropped or
//! rejects the whole query.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

use super::filter::{FilterExpr, FilterOperator, FilterSet};

/// Keys that are never treated as filter fields (compared case-insensitively)
pub const RESERVED_KEYS: [&str; 6] = ["select", "order", "limit", "offset", "apikey", "authorization"];

/// Key carrying the disjunction group
pub const OR_KEY: &str = "or";

/// How malformed filter fragments are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Drop malformed fragments and keep going
    #[default]
    Permissive,
    /// Reject the query on the first malformed fragment
    Strict,
}

/// A query fragment that could not be translated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClauseError {
    #[error("unrecognized operator in {field}={value}")]
    UnknownOperator { field: String, value: String },

    #[error("ilike pattern for {field} must be wrapped in '*': {value}")]
    MalformedPattern { field: String, value: String },

    #[error("in list for {field} must be wrapped in parentheses: {value}")]
    MalformedList { field: String, value: String },

    #[error("or clause must be field.operator.value: {0}")]
    MalformedOrClause(String),

    #[error("unrecognized operator in or clause: {0}")]
    UnknownOrOperator(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("invalid {key}: {value}")]
    InvalidInteger { key: String, value: String },
}

/// Projection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    #[default]
    All,
    Fields(Vec<String>),
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Order by clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn ascending(&self) -> bool {
        self.direction == Direction::Asc
    }
}

/// Parsed query: projection, filters, ordering and pagination
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuerySpec {
    pub select: Selection,
    pub filter: FilterSet,
    pub order: Option<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// What a query parameter means, decided by its key alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKind {
    Select,
    Order,
    Limit,
    Offset,
    Or,
    Reserved,
    Filter,
}

impl ParamKind {
    fn classify(key: &str) -> Self {
        if key == OR_KEY {
            return ParamKind::Or;
        }
        match key.to_ascii_lowercase().as_str() {
            "select" => ParamKind::Select,
            "order" => ParamKind::Order,
            "limit" => ParamKind::Limit,
            "offset" => ParamKind::Offset,
            k if RESERVED_KEYS.contains(&k) => ParamKind::Reserved,
            _ => ParamKind::Filter,
        }
    }
}

impl QuerySpec {
    /// Translate query parameters, silently dropping malformed fragments
    pub fn parse<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        match Self::parse_with_mode(params, ParseMode::Permissive) {
            Ok(spec) => spec,
            // permissive mode never surfaces clause errors
            Err(_) => Self::default(),
        }
    }

    /// Translate query parameters under the given mode
    pub fn parse_with_mode<I, K, V>(params: I, mode: ParseMode) -> Result<Self, ClauseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut result = QuerySpec::default();

        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref());

            match ParamKind::classify(key) {
                ParamKind::Select => {
                    result.select = parse_select(value);
                }
                ParamKind::Order => {
                    result.order = parse_order(value, mode)?;
                }
                ParamKind::Limit => {
                    result.limit = admit(key, parse_count(key, value), mode)?;
                }
                ParamKind::Offset => {
                    result.offset = admit(key, parse_count(key, value), mode)?;
                }
                ParamKind::Or => {
                    let mut group = Vec::new();
                    for clause in parse_or(value, mode) {
                        if let Some(expr) = admit(key, clause, mode)? {
                            group.push(expr);
                        }
                    }
                    result.filter.or_group = Some(group);
                }
                ParamKind::Reserved => {}
                ParamKind::Filter => {
                    if let Some(expr) = admit(key, parse_filter(key, value), mode)? {
                        result.filter.filters.push(expr);
                    }
                }
            }
        }

        Ok(result)
    }
}

/// Apply the parse mode to one fragment
fn admit<T>(key: &str, parsed: Result<T, ClauseError>, mode: ParseMode) -> Result<Option<T>, ClauseError> {
    match parsed {
        Ok(v) => Ok(Some(v)),
        Err(e) if mode == ParseMode::Strict => Err(e),
        Err(e) => {
            tracing::debug!(param = key, error = %e, "ignoring malformed query fragment");
            Ok(None)
        }
    }
}

/// Coerce a raw value: `true`/`false` to bool, numeric text to number,
/// anything else stays a string.
pub fn coerce_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "" => return Value::String(String::new()),
        _ => {}
    }

    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    // non-finite results ("inf", "NaN", "1e999") stay text
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }

    Value::String(raw.to_string())
}

/// Parse select parameter (comma-separated field list)
fn parse_select(value: &str) -> Selection {
    if value.trim() == "*" {
        return Selection::All;
    }

    let fields: Vec<String> = value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if fields.is_empty() {
        Selection::All
    } else {
        Selection::Fields(fields)
    }
}

/// Parse order parameter (`field.direction`)
fn parse_order(value: &str, mode: ParseMode) -> Result<Option<OrderBy>, ClauseError> {
    let (field, direction) = match value.split_once('.') {
        Some((field, direction)) => (field.trim(), Some(direction.trim())),
        None => (value.trim(), None),
    };

    if field.is_empty() {
        return admit("order", Err(ClauseError::InvalidOrder(value.to_string())), mode);
    }

    let direction = match direction.map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("asc") => Direction::Asc,
        Some("desc") => Direction::Desc,
        Some(_) if mode == ParseMode::Strict => {
            return Err(ClauseError::InvalidOrder(value.to_string()));
        }
        Some(_) => Direction::Asc,
    };

    Ok(Some(OrderBy {
        field: field.to_string(),
        direction,
    }))
}

/// Parse limit/offset
fn parse_count(key: &str, value: &str) -> Result<u64, ClauseError> {
    value.trim().parse().map_err(|_| ClauseError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parse a top-level filter from `field=op.value`
fn parse_filter(field: &str, value: &str) -> Result<FilterExpr, ClauseError> {
    if let Some(v) = value.strip_prefix("eq.") {
        return Ok(FilterExpr::new(field, FilterOperator::Eq, coerce_value(v)));
    }
    if let Some(v) = value.strip_prefix("gte.") {
        return Ok(FilterExpr::new(field, FilterOperator::Gte, coerce_value(v)));
    }
    if let Some(v) = value.strip_prefix("lte.") {
        return Ok(FilterExpr::new(field, FilterOperator::Lte, coerce_value(v)));
    }
    if let Some(pattern) = value.strip_prefix("ilike.") {
        return match unwrap_delimited(pattern, '*', '*') {
            Some(needle) => Ok(FilterExpr::ilike(field, needle)),
            None => Err(ClauseError::MalformedPattern {
                field: field.to_string(),
                value: value.to_string(),
            }),
        };
    }
    if let Some(list) = value.strip_prefix("in.") {
        return match unwrap_delimited(list, '(', ')') {
            Some(inner) => Ok(FilterExpr::in_list(field, inner.split(','))),
            None => Err(ClauseError::MalformedList {
                field: field.to_string(),
                value: value.to_string(),
            }),
        };
    }

    Err(ClauseError::UnknownOperator {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Inner text of `open ... close`, if both delimiters are present
fn unwrap_delimited(s: &str, open: char, close: char) -> Option<&str> {
    if s.len() < open.len_utf8() + close.len_utf8() {
        return None;
    }
    s.strip_prefix(open)?.strip_suffix(close)
}

/// Parse the `or=(...)` group into one result per clause
fn parse_or(value: &str, mode: ParseMode) -> Vec<Result<FilterExpr, ClauseError>> {
    let inner = value.strip_prefix('(').unwrap_or(value);
    let inner = inner.strip_suffix(')').unwrap_or(inner);

    split_top_level(inner)
        .into_iter()
        .map(|clause| parse_or_clause(clause, mode))
        .collect()
}

/// Split on commas that are not nested inside parentheses
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Parse one `field.op.value` clause of an OR-group
fn parse_or_clause(clause: &str, mode: ParseMode) -> Result<FilterExpr, ClauseError> {
    let (field, rest) = clause
        .split_once('.')
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| ClauseError::MalformedOrClause(clause.to_string()))?;
    let (op, value) = rest.split_once('.').unwrap_or((rest, ""));
    if op.is_empty() {
        return Err(ClauseError::MalformedOrClause(clause.to_string()));
    }

    let expr = match op {
        "eq" => FilterExpr::new(field, FilterOperator::Eq, coerce_value(value)),
        "ilike" => FilterExpr::ilike(field, value.replace('*', "")),
        "in" => FilterExpr::in_list(field, value.split('|')),
        _ => match FilterOperator::range(op) {
            Some(range) => FilterExpr::new(field, range, coerce_value(value)),
            None if mode == ParseMode::Strict => {
                return Err(ClauseError::UnknownOrOperator(clause.to_string()));
            }
            // unknown operator: equality on the raw remainder
            None => FilterExpr::eq(field, Value::String(rest.to_string())),
        },
    };

    Ok(expr)
}
