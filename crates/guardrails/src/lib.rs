//! # Guardrails
//!
//! Static safety policy for every statement the gateway builds: which tables
//! may be read or written, which columns exist on them, how many rows a caller
//! may page through, which values are redacted on the way out, and what a
//! campaign insert may contain.
//!
//! ## Public API
//!
//! - `SchemaRegistry`: the immutable table/column allowlists, built once at
//!   start-up and passed explicitly to every validating call.
//! - `QueryLimits`: row, offset, filter and IN-list bounds.
//! - `redact_row` / `redact_rows`: replace sensitive values with a sentinel.
//! - `validate_campaign_insert`: turns a raw campaign mapping into a `CampaignRecord`.
//! - `validate_sql_safety`: last check before a statement leaves the process.

pub mod campaign;
pub mod columns;
pub mod error;
pub mod limits;
pub mod redact;
pub mod schema;
pub mod statement;

pub use campaign::{
    AmOption, CampaignRecord, ContactSource, CAMPAIGN_INSERT_COLUMNS,
    CAMPAIGN_REQUIRED_COLUMNS, validate_campaign_insert,
};
pub use error::GuardrailError;
pub use limits::QueryLimits;
pub use redact::{
    EXPLICIT_ONLY_COLUMNS, REDACTED_COLUMNS, REDACTION_SENTINEL, filter_redacted_columns,
    is_explicit_only, is_redacted, redact_row, redact_rows, validate_columns,
};
pub use schema::{OperationKind, SchemaRegistry, TableSchema};
pub use statement::{validate_client_id_required, validate_sql_safety};
