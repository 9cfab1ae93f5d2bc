use crate::backend::{Backend, check_statement, json_to_i64};
use crate::error::DbError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use core_types::{BuiltQuery, DatabaseType, GeneratedKey, Params, Row, SqlValue};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value as JsonValue;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgArguments, PgPool, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo};
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// The Postgres backend, over a shared `PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
    default_timeout: Duration,
}

impl PostgresBackend {
    pub fn new(pool: PgPool, default_timeout: Duration) -> Self {
        Self {
            pool,
            default_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Acquires a connection and sets its session statement timeout.
    async fn acquire(&self, timeout: Option<Duration>) -> Result<PoolConnection<Postgres>, DbError> {
        let started = Instant::now();
        let mut conn = self.pool.acquire().await?;
        info!(ms = started.elapsed().as_millis() as u64, "db:connect");

        let timeout_ms = timeout.unwrap_or(self.default_timeout).as_millis();
        sqlx::query(&format!("SET statement_timeout = {timeout_ms}"))
            .execute(&mut *conn)
            .await?;
        info!(ms = timeout_ms as u64, "db:timeout:set");
        Ok(conn)
    }
}

fn bind_value<'q>(query: PgQuery<'q>, value: &'q SqlValue) -> PgQuery<'q> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::DateTime(dt) => query.bind(*dt),
    }
}

/// Binds positional parameters in order. Named parameters are an Oracle shape.
fn prepare(query: &BuiltQuery) -> Result<PgQuery<'_>, DbError> {
    let Params::Positional(values) = &query.params else {
        return Err(DbError::ParamStyle {
            backend: "postgres",
            expected: "positional",
        });
    };
    Ok(values
        .iter()
        .fold(sqlx::query(&query.sql), |q, value| bind_value(q, value)))
}

fn decimal_to_json(value: Decimal) -> JsonValue {
    if value.scale() == 0 {
        if let Some(i) = value.to_i64() {
            return JsonValue::from(i);
        }
    }
    value
        .to_f64()
        .map(JsonValue::from)
        .unwrap_or_else(|| JsonValue::String(value.to_string()))
}

fn get<'r, T>(row: &'r PgRow, index: usize) -> Result<Option<T>, sqlx::Error>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index)
}

/// Decodes one column by its Postgres type name.
fn decode_column(row: &PgRow, index: usize) -> Result<JsonValue, DbError> {
    let column = &row.columns()[index];
    let type_name = column.type_info().name();
    let value = match type_name {
        "INT2" => get::<i16>(row, index)?.map(JsonValue::from),
        "INT4" => get::<i32>(row, index)?.map(JsonValue::from),
        "INT8" => get::<i64>(row, index)?.map(JsonValue::from),
        "FLOAT4" => get::<f32>(row, index)?.map(JsonValue::from),
        "FLOAT8" => get::<f64>(row, index)?.map(JsonValue::from),
        "NUMERIC" => get::<Decimal>(row, index)?.map(decimal_to_json),
        "BOOL" => get::<bool>(row, index)?.map(JsonValue::from),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            get::<String>(row, index)?.map(JsonValue::from)
        }
        "DATE" => get::<NaiveDate>(row, index)?
            .map(|d| JsonValue::from(d.format("%Y-%m-%d").to_string())),
        "TIMESTAMP" => get::<NaiveDateTime>(row, index)?
            .map(|dt| JsonValue::from(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, index)?.map(|dt| JsonValue::from(dt.to_rfc3339())),
        "UUID" => get::<Uuid>(row, index)?.map(|u| JsonValue::from(u.to_string())),
        "JSON" | "JSONB" => get::<JsonValue>(row, index)?,
        other => match get::<String>(row, index) {
            Ok(value) => value.map(JsonValue::from),
            Err(_) => {
                return Err(DbError::Decode {
                    column: column.name().to_string(),
                    type_name: other.to_string(),
                });
            }
        },
    };
    Ok(value.unwrap_or(JsonValue::Null))
}

fn decode_row(row: &PgRow) -> Result<Row, DbError> {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), decode_column(row, index)?);
    }
    Ok(out)
}

#[async_trait]
impl Backend for PostgresBackend {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    async fn fetch_all(&self, query: &BuiltQuery, timeout: Option<Duration>) -> Result<Vec<Row>, DbError> {
        check_statement(query, false)?;
        info!(sql = %query.sql, "db:query");
        let mut conn = self.acquire(timeout).await?;

        let started = Instant::now();
        let pg_rows = prepare(query)?.fetch_all(&mut *conn).await?;
        info!(ms = started.elapsed().as_millis() as u64, "db:execute");

        let started = Instant::now();
        let rows = pg_rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        info!(ms = started.elapsed().as_millis() as u64, rows = rows.len(), "db:fetch");
        Ok(rows)
    }

    async fn execute(&self, query: &BuiltQuery) -> Result<u64, DbError> {
        check_statement(query, true)?;
        info!(sql = %query.sql, "db:query");
        let mut conn = self.acquire(None).await?;

        let started = Instant::now();
        let affected = prepare(query)?.execute(&mut *conn).await?.rows_affected();
        info!(ms = started.elapsed().as_millis() as u64, rows = affected, "db:execute");
        Ok(affected)
    }

    async fn insert_returning_key(&self, query: &BuiltQuery, key: &GeneratedKey) -> Result<i64, DbError> {
        check_statement(query, true)?;
        info!(sql = %query.sql, "db:query");
        let mut conn = self.acquire(None).await?;

        let row = prepare(query)?.fetch_one(&mut *conn).await?;
        let index = key_index(row.columns().iter().map(|c| c.name()), &key.column)?;
        json_to_i64(&decode_column(&row, index)?)
            .ok_or_else(|| DbError::MissingGeneratedKey(key.column.clone()))
    }
}

/// Position of the generated-key column in a RETURNING row.
fn key_index<'a>(mut names: impl Iterator<Item = &'a str>, column: &str) -> Result<usize, DbError> {
    names
        .position(|name| name.eq_ignore_ascii_case(column))
        .ok_or_else(|| DbError::MissingGeneratedKey(column.to_string()))
}
