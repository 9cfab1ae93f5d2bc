//! # Query Builder
//!
//! Turns validated requests into parameterized SQL for Postgres or Oracle.
//!
//! - `filter`: the filter DSL (`FilterSet`, `Filter`) and its translation into a `Predicate`.
//! - `dialect`: the `Dialect` trait with the Postgres and Oracle strategies.
//! - `assembler`: `QueryAssembler`, which builds select, count, join, union and insert statements.
//! - `archive`: which live and month-suffixed archive tables a historical read covers.
//! - `router`: classifies a database link as Postgres or Oracle.
//!
//! Nothing here touches a database. Every error is raised before a statement exists.

pub mod archive;
pub mod assembler;
pub mod binder;
pub mod date;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod order;
pub mod router;

pub use archive::resolve_transaction_tables;
pub use assembler::{CAMPAIGN_KEY_BIND, JoinedSelectSpec, QueryAssembler, SelectSpec};
pub use binder::{Binder, PlaceholderStyle};
pub use dialect::{Dialect, ORACLE, OracleDialect, POSTGRES, PostgresDialect, dialect_for};
pub use error::QueryError;
pub use filter::{Condition, Filter, FilterOp, FilterSet, Operand, Predicate};
pub use order::{Direction, OrderBy};
pub use router::{DEFAULT_POSTGRES_MARKER, classify};
