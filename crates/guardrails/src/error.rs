use thiserror::Error;

/// A policy violation detected before any statement reaches a backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardrailError {
    #[error("Table name must be a non-empty string")]
    EmptyTableName,

    #[error("Table '{table}' is not allowed for {kind}. Allowed tables: {allowed:?}")]
    TableNotAllowed {
        table: String,
        kind: String,
        allowed: Vec<String>,
    },

    #[error("Limit must be a positive integer")]
    InvalidLimit,

    #[error("Offset must be a non-negative integer")]
    NegativeOffset,

    #[error("Offset exceeds maximum allowed value of {0}")]
    OffsetTooLarge(i64),

    #[error("Too many filters. Maximum allowed: {0}")]
    TooManyFilters(usize),

    #[error("IN clause for '{column}' exceeds maximum of {max} values")]
    TooManyInValues { column: String, max: usize },

    #[error("Cannot access redacted columns: {0:?}")]
    RedactedColumns(Vec<String>),

    #[error("Campaign data must be a non-empty mapping")]
    EmptyCampaignData,

    #[error("Missing required columns for campaign: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Columns not allowed for campaign insert: {0:?}")]
    DisallowedColumns(Vec<String>),

    #[error("client_id must be a positive integer")]
    InvalidClientId,

    #[error("{field} must be one of: {allowed:?}")]
    InvalidEnumValue {
        field: &'static str,
        allowed: Vec<&'static str>,
    },

    #[error("Invalid value for campaign column '{column}': {reason}")]
    InvalidCampaignValue { column: String, reason: String },

    #[error("Operation '{0}' is not allowed")]
    DisallowedOperation(String),

    #[error("Only SELECT queries are allowed (INSERT requires explicit permission)")]
    StatementKindNotAllowed,

    #[error("client_id is required for {0}. Please provide a client_id filter.")]
    ClientIdRequired(String),
}
