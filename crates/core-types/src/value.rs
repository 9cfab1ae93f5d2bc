use crate::error::CoreError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A single result row, keyed by column name in select-list order.
pub type Row = serde_json::Map<String, JsonValue>;

/// A value that can be bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Converts a scalar JSON value into a bind value.
    ///
    /// Arrays and objects are rejected: they are operand shapes, not values.
    pub fn from_json(value: &JsonValue) -> Result<Self, CoreError> {
        match value {
            JsonValue::Null => Ok(SqlValue::Null),
            JsonValue::Bool(b) => Ok(SqlValue::Bool(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(SqlValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(SqlValue::Float(f))
                } else {
                    Err(CoreError::UnsupportedValue(n.to_string()))
                }
            }
            JsonValue::String(s) => Ok(SqlValue::Text(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => {
                Err(CoreError::UnsupportedValue(value.to_string()))
            }
        }
    }

    /// Converts the bind value back to JSON (dates as ISO-8601 strings).
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(b) => JsonValue::Bool(*b),
            SqlValue::Int(i) => JsonValue::from(*i),
            SqlValue::Float(f) => JsonValue::from(*f),
            SqlValue::Text(s) => JsonValue::String(s.clone()),
            SqlValue::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            SqlValue::DateTime(dt) => {
                JsonValue::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())
            }
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// Statement parameters in the placeholder style of the target dialect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Params {
    /// `$1, $2, ...` for Postgres, bound in order.
    Positional(Vec<SqlValue>),
    /// `:name` for Oracle, bound by name. Insertion order is kept for logging.
    Named(Vec<(String, SqlValue)>),
}

impl Params {
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a named parameter. Always `None` for positional params.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        match self {
            Params::Positional(_) => None,
            Params::Named(values) => values.iter().find(|(n, _)| n == name).map(|(_, v)| v),
        }
    }

    /// All bound values in binding order, regardless of style.
    pub fn values(&self) -> Vec<&SqlValue> {
        match self {
            Params::Positional(values) => values.iter().collect(),
            Params::Named(values) => values.iter().map(|(_, v)| v).collect(),
        }
    }
}

/// An immutable statement ready to hand to a backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Params,
}

impl BuiltQuery {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Where an INSERT hands back its server-generated key.
///
/// `column` is the key column named in the `RETURNING` clause; `bind` is the
/// output placeholder name for backends that return keys through an out bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedKey {
    pub column: String,
    pub bind: String,
}

impl GeneratedKey {
    pub fn new(column: impl Into<String>, bind: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            bind: bind.into(),
        }
    }
}
