use crate::error::DbError;
use async_trait::async_trait;
use core_types::{BuiltQuery, DatabaseType, GeneratedKey, Row};
use guardrails::validate_sql_safety;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// A relational backend reduced to the three capabilities the gateway needs.
///
/// Each call acquires its own connection and releases it on every exit path.
/// Nothing is retried.
#[async_trait]
pub trait Backend: Send + Sync {
    fn database_type(&self) -> DatabaseType;

    /// Runs a read and returns every row as an ordered column-to-value map.
    /// `timeout` bounds the statement; `None` uses the backend default.
    async fn fetch_all(&self, query: &BuiltQuery, timeout: Option<Duration>) -> Result<Vec<Row>, DbError>;

    /// Runs a write, commits, and returns the affected row count.
    async fn execute(&self, query: &BuiltQuery) -> Result<u64, DbError>;

    /// Runs an INSERT, commits, and returns the server-generated key.
    async fn insert_returning_key(&self, query: &BuiltQuery, key: &GeneratedKey) -> Result<i64, DbError>;
}

/// Last check before a statement leaves the process.
pub fn check_statement(query: &BuiltQuery, allow_insert: bool) -> Result<(), DbError> {
    validate_sql_safety(&query.sql, allow_insert)?;
    Ok(())
}

/// Reads an integer out of a decoded value. Numeric text is accepted since
/// some drivers hand NUMBER columns back as strings.
pub fn json_to_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extracts the `count` column from a `SELECT COUNT(*) AS count` result.
pub fn count_from_rows(rows: &[Row]) -> i64 {
    rows.first()
        .and_then(|row| {
            row.get("count")
                .or_else(|| row.values().next())
                .and_then(json_to_i64)
        })
        .unwrap_or(0)
}
