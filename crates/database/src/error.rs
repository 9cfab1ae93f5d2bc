use guardrails::GuardrailError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("The {0} backend is not configured")]
    NotConfigured(&'static str),

    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Oracle error: {0}")]
    Oracle(#[from] oracle::Error),

    #[error("Statement rejected before execution: {0}")]
    Unsafe(#[from] GuardrailError),

    #[error("{backend} expects {expected} parameters")]
    ParamStyle {
        backend: &'static str,
        expected: &'static str,
    },

    #[error("Cannot decode column '{column}' of type {type_name}")]
    Decode { column: String, type_name: String },

    #[error("The insert did not return a generated key for '{0}'")]
    MissingGeneratedKey(String),

    #[error("Database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("The requested data was not found in the database.")]
    NotFound,
}
