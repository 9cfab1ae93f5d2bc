//! SQL dialects (Strategy pattern).
//!
//! One assembler builds every statement; the differences between Postgres
//! and Oracle live here: placeholder style, identifier case, pagination,
//! table qualification, case-insensitive matching and generated-key capture.

use crate::binder::{Binder, PlaceholderStyle};
use core_types::{DatabaseType, SqlValue};
use std::fmt::Debug;

/// The syntax capabilities of one backend.
pub trait Dialect: Debug + Send + Sync {
    fn database_type(&self) -> DatabaseType;

    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Applies the dialect's identifier case to an already validated name.
    fn ident(&self, name: &str) -> String;

    /// Qualifies a schema-qualified physical table, optionally over a database link.
    fn table_name(&self, physical: &str, db_link: Option<&str>) -> String;

    /// Maps a link-qualified table name (as produced by the archive resolver)
    /// onto a name this dialect can address.
    fn localize_table(&self, qualified: &str) -> String;

    /// Case-insensitive pattern match.
    fn ilike(&self, column: &str, placeholder: &str, negated: bool) -> String;

    /// Whether date-like text operands are converted to date values before binding.
    fn coerces_date_strings(&self) -> bool;

    /// Whether every branch of a UNION needs its own copy of the parameters.
    fn repeats_params_per_branch(&self) -> bool;

    /// Alias appended to a derived table in `FROM (...)`.
    fn derived_table_alias(&self) -> &'static str;

    /// Caps the row count at an already bound placeholder, including the leading space.
    fn fetch_first(&self, placeholder: &str) -> String;

    /// Row-limiting clause with optional offset, including its leading space.
    fn limit_clause(&self, limit: i64, offset: Option<i64>, binder: &mut Binder) -> String;

    /// Clause that hands a generated key back to the caller, including its leading space.
    fn returning_clause(&self, key_column: &str, key_bind: &str) -> String;

    fn binder(&self) -> Binder {
        Binder::new(self.placeholder_style())
    }

    fn name(&self) -> &'static str {
        self.database_type().as_str()
    }
}

/// PostgreSQL: lowercase identifiers, `$n` placeholders, `LIMIT/OFFSET`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

/// Oracle: uppercase identifiers, `:name` placeholders, `FETCH FIRST`, database links.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

pub static POSTGRES: PostgresDialect = PostgresDialect;
pub static ORACLE: OracleDialect = OracleDialect;

/// Selects the dialect for a routed database type.
pub fn dialect_for(database_type: DatabaseType) -> &'static dyn Dialect {
    match database_type {
        DatabaseType::Postgres => &POSTGRES,
        DatabaseType::Oracle => &ORACLE,
    }
}

impl Dialect for PostgresDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    fn ident(&self, name: &str) -> String {
        name.to_lowercase()
    }

    fn table_name(&self, physical: &str, _db_link: Option<&str>) -> String {
        // Postgres tenants are reached through their own connection, never a link.
        physical.to_lowercase()
    }

    fn localize_table(&self, qualified: &str) -> String {
        let base = qualified.split('@').next().unwrap_or(qualified);
        base.to_lowercase()
    }

    fn ilike(&self, column: &str, placeholder: &str, negated: bool) -> String {
        let op = if negated { "NOT ILIKE" } else { "ILIKE" };
        format!("{column} {op} {placeholder}")
    }

    fn coerces_date_strings(&self) -> bool {
        false
    }

    fn repeats_params_per_branch(&self) -> bool {
        true
    }

    fn derived_table_alias(&self) -> &'static str {
        " AS combined"
    }

    fn fetch_first(&self, placeholder: &str) -> String {
        format!(" LIMIT {placeholder}")
    }

    fn limit_clause(&self, limit: i64, offset: Option<i64>, binder: &mut Binder) -> String {
        let limit = binder.bind_named("limit", SqlValue::Int(limit));
        match offset {
            Some(offset) => {
                let offset = binder.bind_named("offset", SqlValue::Int(offset));
                format!(" LIMIT {limit} OFFSET {offset}")
            }
            None => self.fetch_first(&limit),
        }
    }

    fn returning_clause(&self, key_column: &str, _key_bind: &str) -> String {
        format!(" RETURNING {}", self.ident(key_column))
    }
}

impl Dialect for OracleDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Oracle
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Named
    }

    fn ident(&self, name: &str) -> String {
        name.to_uppercase()
    }

    fn table_name(&self, physical: &str, db_link: Option<&str>) -> String {
        match db_link {
            Some(link) if !link.trim().is_empty() => {
                format!("{}@{}", physical.to_uppercase(), link.trim())
            }
            _ => physical.to_uppercase(),
        }
    }

    fn localize_table(&self, qualified: &str) -> String {
        qualified.to_string()
    }

    fn ilike(&self, column: &str, placeholder: &str, negated: bool) -> String {
        let op = if negated { "NOT LIKE" } else { "LIKE" };
        format!("LOWER({column}) {op} LOWER({placeholder})")
    }

    fn coerces_date_strings(&self) -> bool {
        true
    }

    fn repeats_params_per_branch(&self) -> bool {
        false
    }

    fn derived_table_alias(&self) -> &'static str {
        ""
    }

    fn fetch_first(&self, placeholder: &str) -> String {
        format!(" FETCH FIRST {placeholder} ROWS ONLY")
    }

    fn limit_clause(&self, limit: i64, offset: Option<i64>, binder: &mut Binder) -> String {
        let limit = binder.bind_named("limit", SqlValue::Int(limit));
        match offset {
            Some(offset) if offset > 0 => {
                let offset = binder.bind_named("offset", SqlValue::Int(offset));
                format!(" OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY")
            }
            _ => self.fetch_first(&limit),
        }
    }

    fn returning_clause(&self, key_column: &str, key_bind: &str) -> String {
        format!(" RETURNING {} INTO :{key_bind}", self.ident(key_column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_differs_per_dialect() {
        let mut pg = POSTGRES.binder();
        assert_eq!(POSTGRES.limit_clause(10, Some(20), &mut pg), " LIMIT $1 OFFSET $2");

        let mut ora = ORACLE.binder();
        assert_eq!(ORACLE.limit_clause(10, None, &mut ora), " FETCH FIRST :limit ROWS ONLY");
    }

    #[test]
    fn tables_are_qualified_per_dialect() {
        assert_eq!(
            ORACLE.table_name("lvousr.contact", Some("dial.example")),
            "LVOUSR.CONTACT@dial.example"
        );
        assert_eq!(POSTGRES.table_name("LVOUSR.Contact", Some("pg_dial")), "lvousr.contact");
        assert_eq!(
            POSTGRES.localize_table("LVOUSR.TRANSACTION_0126@report.example"),
            "lvousr.transaction_0126"
        );
    }

    #[test]
    fn case_insensitive_match_per_dialect() {
        assert_eq!(POSTGRES.ilike("account", "$1", true), "account NOT ILIKE $1");
        assert_eq!(ORACLE.ilike("ACCOUNT", ":p1", false), "LOWER(ACCOUNT) LIKE LOWER(:p1)");
    }

    #[test]
    fn generated_keys_are_returned_per_dialect() {
        assert_eq!(POSTGRES.returning_clause("campaign_id", "out_campaign_id"), " RETURNING campaign_id");
        assert_eq!(
            ORACLE.returning_clause("campaign_id", "out_campaign_id"),
            " RETURNING CAMPAIGN_ID INTO :out_campaign_id"
        );
    }

    #[test]
    fn routing_type_selects_dialect() {
        assert_eq!(dialect_for(DatabaseType::Oracle).name(), "oracle");
        assert_eq!(dialect_for(DatabaseType::Postgres).name(), "postgres");
    }
}
