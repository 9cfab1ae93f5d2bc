//! # Database Crate
//!
//! The gateway's only contact with real databases. Every statement arrives
//! fully built (`BuiltQuery`) and leaves as ordered JSON rows.
//!
//! ## Architectural Principles
//!
//! - **Two backends, one capability:** `Backend` reduces PostgreSQL (sqlx pool)
//!   and Oracle (blocking driver on tokio's blocking pool) to `fetch_all`,
//!   `execute` and `insert_returning_key`.
//! - **Scoped connections:** each call acquires its own connection and releases
//!   it on every exit path. No retries.
//! - **Last line of defence:** every statement passes `guardrails::validate_sql_safety`
//!   before it is sent.
//!
//! ## Public API
//!
//! - `connect` / `OracleConnector`: connection setup from `configuration` settings.
//! - `PostgresBackend`, `OracleBackend`: the two `Backend` implementations.
//! - `ClientDirectory` / `BackendClientDirectory`: client link and skill lookups.
//! - `DbError`: the specific error types that can be returned from this crate.

pub mod backend;
pub mod connection;
pub mod directory;
pub mod error;
pub mod oracle_backend;
pub mod postgres_backend;

pub use backend::{Backend, check_statement, count_from_rows, json_to_i64};
pub use connection::{OracleConnector, connect};
pub use directory::{BackendClientDirectory, ClientDirectory, ClientLinks};
pub use error::DbError;
pub use oracle_backend::OracleBackend;
pub use postgres_backend::PostgresBackend;
