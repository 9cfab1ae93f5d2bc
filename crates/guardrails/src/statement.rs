use crate::error::GuardrailError;
use serde_json::{Map, Value as JsonValue};

/// Keywords that may never appear as a token in an outgoing statement.
const DISALLOWED_OPERATIONS: &[&str] = &[
    "DELETE", "UPDATE", "DROP", "TRUNCATE", "ALTER", "CREATE", "GRANT", "REVOKE",
];

/// Splits SQL into upper-cased word tokens, skipping quoted literals and
/// quoted identifiers.
fn keyword_tokens(sql: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        if ch == '\'' || ch == '"' {
            quote = Some(ch);
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else if ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '@' {
            current.extend(ch.to_uppercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Checks a statement right before execution.
///
/// Only SELECT is accepted, or INSERT when `allow_insert` is set, and no
/// token may name a disallowed operation. Identifiers such as `CREATEDATE`
/// or `TRANSACTION_UPDATE` are single tokens and do not match.
pub fn validate_sql_safety(sql: &str, allow_insert: bool) -> Result<(), GuardrailError> {
    let tokens = keyword_tokens(sql);

    if let Some(op) = tokens
        .iter()
        .find(|t| DISALLOWED_OPERATIONS.contains(&t.as_str()))
    {
        return Err(GuardrailError::DisallowedOperation(op.clone()));
    }

    match tokens.first().map(String::as_str) {
        Some("SELECT") => Ok(()),
        Some("INSERT") if allow_insert => Ok(()),
        _ => Err(GuardrailError::StatementKindNotAllowed),
    }
}

/// Fails unless the filters carry a `client_id` key.
pub fn validate_client_id_required(
    filters: Option<&Map<String, JsonValue>>,
    operation: &str,
) -> Result<(), GuardrailError> {
    let present = filters
        .map(|f| f.keys().any(|k| k.trim().eq_ignore_ascii_case("client_id")))
        .unwrap_or(false);
    if !present {
        return Err(GuardrailError::ClientIdRequired(operation.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_select_is_allowed() {
        assert!(validate_sql_safety("SELECT * FROM lvousr.contact WHERE client_id = $1", false).is_ok());
    }

    #[test]
    fn insert_requires_permission() {
        let sql = "INSERT INTO lvousr.campaign (client_id) VALUES (:client_id)";
        assert_eq!(validate_sql_safety(sql, false), Err(GuardrailError::StatementKindNotAllowed));
        assert!(validate_sql_safety(sql, true).is_ok());
    }

    #[test]
    fn disallowed_keywords_are_rejected_anywhere() {
        assert_eq!(
            validate_sql_safety("SELECT 1; DROP TABLE x", false),
            Err(GuardrailError::DisallowedOperation("DROP".into()))
        );
        assert_eq!(
            validate_sql_safety("delete from lvousr.contact", false),
            Err(GuardrailError::DisallowedOperation("DELETE".into()))
        );
    }

    #[test]
    fn identifiers_containing_keywords_are_not_false_positives() {
        let sql = "SELECT createdate, TRANSACTION_UPDATE, PHONE_UPDATE FROM LVOUSR.TRANSACTION@DIAL";
        assert!(validate_sql_safety(sql, false).is_ok());
    }

    #[test]
    fn keywords_inside_literals_are_ignored() {
        assert!(validate_sql_safety("SELECT 'drop table' AS note FROM dual", false).is_ok());
    }

    #[test]
    fn client_id_filter_requirement() {
        let with = json!({"CLIENT_ID": 5}).as_object().cloned().unwrap();
        let without = json!({"account": "A1"}).as_object().cloned().unwrap();
        assert!(validate_client_id_required(Some(&with), "select_contact").is_ok());
        assert_eq!(
            validate_client_id_required(Some(&without), "select_contact"),
            Err(GuardrailError::ClientIdRequired("select_contact".into()))
        );
        assert!(validate_client_id_required(None, "select_contact").is_err());
    }
}
