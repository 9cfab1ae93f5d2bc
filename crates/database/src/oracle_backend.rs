use crate::backend::{Backend, check_statement};
use crate::connection::OracleConnector;
use crate::error::DbError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use core_types::{BuiltQuery, DatabaseType, GeneratedKey, Params, Row, SqlValue};
use oracle::sql_type::{OracleType, ToSql};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// The Oracle backend. The driver is blocking, so every call opens its own
/// session on tokio's blocking pool and closes it when the call returns.
#[derive(Debug, Clone)]
pub struct OracleBackend {
    connector: Arc<OracleConnector>,
}

/// An owned bind value in a shape the Oracle driver accepts.
enum OracleBind {
    Null(Option<String>),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl OracleBind {
    fn from_value(value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => OracleBind::Null(None),
            // NUMBER(1) flags.
            SqlValue::Bool(b) => OracleBind::Int(i64::from(*b)),
            SqlValue::Int(i) => OracleBind::Int(*i),
            SqlValue::Float(f) => OracleBind::Float(*f),
            SqlValue::Text(s) => OracleBind::Text(s.clone()),
            SqlValue::Date(d) => OracleBind::Date(*d),
            SqlValue::DateTime(dt) => OracleBind::DateTime(*dt),
        }
    }

    fn as_sql(&self) -> &dyn ToSql {
        match self {
            OracleBind::Null(v) => v,
            OracleBind::Int(v) => v,
            OracleBind::Float(v) => v,
            OracleBind::Text(v) => v,
            OracleBind::Date(v) => v,
            OracleBind::DateTime(v) => v,
        }
    }
}

/// Owned named binds, detached from the request so they can move to a blocking task.
fn named_binds(query: &BuiltQuery) -> Result<Vec<(String, OracleBind)>, DbError> {
    match &query.params {
        Params::Named(values) => Ok(values
            .iter()
            .map(|(name, value)| (name.clone(), OracleBind::from_value(value)))
            .collect()),
        Params::Positional(values) if values.is_empty() => Ok(Vec::new()),
        Params::Positional(_) => Err(DbError::ParamStyle {
            backend: "oracle",
            expected: "named",
        }),
    }
}

fn bind_refs(binds: &[(String, OracleBind)]) -> Vec<(&str, &dyn ToSql)> {
    binds.iter().map(|(n, v)| (n.as_str(), v.as_sql())).collect()
}

/// Numbers come back as text and are narrowed to the tightest JSON number.
fn number_to_json(text: String) -> JsonValue {
    if let Ok(i) = text.parse::<i64>() {
        return JsonValue::from(i);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => JsonValue::from(f),
        _ => JsonValue::String(text),
    }
}

fn decode_column(row: &oracle::Row, index: usize, oracle_type: &OracleType) -> Result<JsonValue, DbError> {
    let value = match oracle_type {
        OracleType::Number(..)
        | OracleType::Float(_)
        | OracleType::BinaryFloat
        | OracleType::BinaryDouble
        | OracleType::Int64
        | OracleType::UInt64 => row.get::<usize, Option<String>>(index)?.map(number_to_json),
        OracleType::Date | OracleType::Timestamp(_) => row
            .get::<usize, Option<NaiveDateTime>>(index)?
            .map(|dt| JsonValue::from(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        OracleType::TimestampTZ(_) | OracleType::TimestampLTZ(_) => row
            .get::<usize, Option<DateTime<FixedOffset>>>(index)?
            .map(|dt| JsonValue::from(dt.to_rfc3339())),
        _ => row.get::<usize, Option<String>>(index)?.map(JsonValue::from),
    };
    Ok(value.unwrap_or(JsonValue::Null))
}

impl OracleBackend {
    pub fn new(connector: OracleConnector) -> Self {
        Self {
            connector: Arc::new(connector),
        }
    }

    /// Runs `work` with a fresh session on the blocking pool.
    async fn with_connection<T, F>(&self, timeout: Option<Duration>, work: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&oracle::Connection) -> Result<T, DbError> + Send + 'static,
    {
        let connector = Arc::clone(&self.connector);
        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let conn = connector.connect(timeout)?;
            info!(ms = started.elapsed().as_millis() as u64, "db:connect");
            let result = work(&conn);
            // Close explicitly so a failed close is logged rather than lost in Drop.
            if let Err(e) = conn.close() {
                tracing::warn!(error = %e, "failed to close oracle session");
            }
            result
        })
        .await?
    }
}

#[async_trait]
impl Backend for OracleBackend {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Oracle
    }

    async fn fetch_all(&self, query: &BuiltQuery, timeout: Option<Duration>) -> Result<Vec<Row>, DbError> {
        check_statement(query, false)?;
        info!(sql = %query.sql, "db:query");
        let sql = query.sql.clone();
        let binds = named_binds(query)?;

        self.with_connection(timeout, move |conn| {
            let started = Instant::now();
            let result_set = conn.query_named(&sql, &bind_refs(&binds))?;
            info!(ms = started.elapsed().as_millis() as u64, "db:execute");

            let columns: Vec<(String, OracleType)> = result_set
                .column_info()
                .iter()
                .map(|c| (c.name().to_lowercase(), c.oracle_type().clone()))
                .collect();

            let started = Instant::now();
            let mut rows = Vec::new();
            for row in result_set {
                let row = row?;
                let mut out = Row::new();
                for (index, (name, oracle_type)) in columns.iter().enumerate() {
                    out.insert(name.clone(), decode_column(&row, index, oracle_type)?);
                }
                rows.push(out);
            }
            info!(ms = started.elapsed().as_millis() as u64, rows = rows.len(), "db:fetch");
            Ok(rows)
        })
        .await
    }

    async fn execute(&self, query: &BuiltQuery) -> Result<u64, DbError> {
        check_statement(query, true)?;
        info!(sql = %query.sql, "db:query");
        let sql = query.sql.clone();
        let binds = named_binds(query)?;

        self.with_connection(None, move |conn| {
            let started = Instant::now();
            let statement = conn.execute_named(&sql, &bind_refs(&binds))?;
            let affected = statement.row_count()?;
            conn.commit()?;
            info!(ms = started.elapsed().as_millis() as u64, rows = affected, "db:execute");
            Ok(affected)
        })
        .await
    }

    async fn insert_returning_key(&self, query: &BuiltQuery, key: &GeneratedKey) -> Result<i64, DbError> {
        check_statement(query, true)?;
        info!(sql = %query.sql, "db:query");
        let sql = query.sql.clone();
        let binds = named_binds(query)?;
        let key = key.clone();

        self.with_connection(None, move |conn| {
            let mut refs = bind_refs(&binds);
            refs.push((key.bind.as_str(), &OracleType::Int64));

            let mut statement = conn.statement(&sql).build()?;
            statement.execute_named(&refs)?;
            let ids: Vec<i64> = statement.returned_values(key.bind.as_str())?;
            conn.commit()?;
            ids.first()
                .copied()
                .ok_or_else(|| DbError::MissingGeneratedKey(key.column.clone()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_narrow_to_json() {
        assert_eq!(number_to_json("42".into()), JsonValue::from(42));
        assert_eq!(number_to_json("12.5".into()), JsonValue::from(12.5));
        assert_eq!(number_to_json("1e400".into()), JsonValue::from("1e400"));
    }

    #[test]
    fn positional_params_are_rejected() {
        let query = BuiltQuery::new("SELECT 1 FROM dual", Params::Positional(vec![SqlValue::Int(1)]));
        assert!(matches!(named_binds(&query), Err(DbError::ParamStyle { .. })));

        let query = BuiltQuery::new(
            "SELECT 1 FROM dual WHERE x = :p1",
            Params::Named(vec![("p1".into(), SqlValue::Bool(true))]),
        );
        let binds = named_binds(&query).unwrap();
        assert!(matches!(binds[0].1, OracleBind::Int(1)));
    }
}
