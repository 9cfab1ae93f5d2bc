use core_types::CoreError;
use guardrails::GuardrailError;
use thiserror::Error;

/// A statement could not be built. Raised before anything reaches a backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Invalid table: {0}")]
    UnknownTable(String),

    #[error("Invalid filter column for {table}: {column}")]
    UnknownFilterColumn { table: String, column: String },

    #[error("Invalid columns for {table}: {columns:?}")]
    UnknownColumns { table: String, columns: Vec<String> },

    #[error("Unsupported filter operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid filter for '{column}': {op} operator requires {expected}")]
    InvalidOperand {
        column: String,
        op: String,
        expected: &'static str,
    },

    #[error("Filters must be a mapping of column names to values")]
    FiltersNotAMapping,

    #[error("Invalid order_by column for {table}: {column}")]
    UnknownOrderColumn { table: String, column: String },

    #[error("order_by direction must be ASC or DESC, got '{0}'")]
    InvalidDirection(String),

    #[error("order_by must be '<column>' or '<column> ASC|DESC', got '{0}'")]
    MalformedOrderBy(String),

    #[error("At least one table must be provided")]
    NoTables,

    #[error("dialing_db is required")]
    MissingDialingDb,

    #[error(transparent)]
    Guardrail(#[from] GuardrailError),

    #[error(transparent)]
    Value(#[from] CoreError),
}
