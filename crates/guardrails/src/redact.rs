use crate::error::GuardrailError;
use core_types::Row;
use serde_json::Value as JsonValue;

/// Columns whose values never leave the process in clear.
pub const REDACTED_COLUMNS: &[&str] = &[
    "ssn",
    "dob",
    "password",
    "password_hash",
    "api_key",
    "secret",
    "token",
];

/// Columns that are left out when a wildcard projection is expanded.
pub const EXPLICIT_ONLY_COLUMNS: &[&str] = &["ssn", "dob"];

pub const REDACTION_SENTINEL: &str = "***REDACTED***";

/// Output-name prefixes of the joined contact/details projection.
const JOINED_PREFIXES: &[&str] = &["contact_", "details_"];

/// Matches a sensitive column by its own name or by its joined alias
/// (`contact_ssn`, `DETAILS_DOB`).
pub fn is_redacted(column: &str) -> bool {
    let column = column.trim().to_lowercase();
    let bare = JOINED_PREFIXES
        .iter()
        .find_map(|prefix| column.strip_prefix(prefix))
        .unwrap_or(column.as_str());
    REDACTED_COLUMNS.contains(&column.as_str()) || REDACTED_COLUMNS.contains(&bare)
}

pub fn is_explicit_only(column: &str) -> bool {
    let column = column.to_lowercase();
    EXPLICIT_ONLY_COLUMNS.contains(&column.as_str())
}

/// Replaces the value of every sensitive column with the sentinel.
pub fn redact_row(row: Row) -> Row {
    row.into_iter()
        .map(|(column, value)| {
            if is_redacted(&column) {
                (column, JsonValue::String(REDACTION_SENTINEL.to_string()))
            } else {
                (column, value)
            }
        })
        .collect()
}

pub fn redact_rows(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter().map(redact_row).collect()
}

/// In strict mode, fails when any requested column is redacted.
pub fn validate_columns(columns: Option<&[String]>, strict: bool) -> Result<(), GuardrailError> {
    let Some(columns) = columns else {
        return Ok(());
    };
    if strict {
        let mut requested: Vec<String> = columns
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| is_redacted(c))
            .collect();
        if !requested.is_empty() {
            requested.sort();
            requested.dedup();
            return Err(GuardrailError::RedactedColumns(requested));
        }
    }
    Ok(())
}

/// Drops redacted columns from a projection list.
pub fn filter_redacted_columns(columns: Option<&[String]>) -> Option<Vec<String>> {
    columns.map(|cols| cols.iter().filter(|c| !is_redacted(c.trim())).cloned().collect())
}
