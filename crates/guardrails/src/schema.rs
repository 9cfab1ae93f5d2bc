use crate::columns::{
    CAMPAIGN_COLUMNS, CLIENT_COLUMNS, CONTACT_COLUMNS, TRANSACTION_COLUMNS,
    contact_details_columns,
};
use crate::error::GuardrailError;
use crate::limits::QueryLimits;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// The kind of statement a table is being validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Select,
    Insert,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Select => f.write_str("SELECT"),
            OperationKind::Insert => f.write_str("INSERT"),
        }
    }
}

/// A logical table: its physical qualified name and its allowed columns.
///
/// Column names are held lowercase in table order; lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    name: String,
    physical: String,
    columns: Vec<String>,
    column_set: HashSet<String>,
    key_column: Option<String>,
}

impl TableSchema {
    pub fn new<I, S>(name: &str, physical: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .collect();
        let column_set = columns.iter().cloned().collect();
        Self {
            name: name.to_lowercase(),
            physical: physical.to_string(),
            columns,
            column_set,
            key_column: None,
        }
    }

    /// Marks the server-generated primary key column.
    pub fn with_key(mut self, column: &str) -> Self {
        self.key_column = Some(column.to_lowercase());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema-qualified physical name, without any database link.
    pub fn physical(&self) -> &str {
        &self.physical
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn key_column(&self) -> Option<&str> {
        self.key_column.as_deref()
    }

    /// Resolves a caller-supplied column to its canonical lowercase name.
    pub fn resolve_column(&self, column: &str) -> Option<&str> {
        let wanted = column.trim().to_lowercase();
        self.column_set.get(&wanted).map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.resolve_column(column).is_some()
    }
}

/// The immutable set of table schemas and per-operation table allowlists.
///
/// Built once at start-up and handed to every validating call, so tests can
/// substitute their own registry.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, TableSchema>,
    select_tables: BTreeSet<String>,
    insert_tables: BTreeSet<String>,
    limits: QueryLimits,
}

impl SchemaRegistry {
    /// An empty registry with default limits.
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
            select_tables: BTreeSet::new(),
            insert_tables: BTreeSet::new(),
            limits: QueryLimits::DEFAULT,
        }
    }

    /// The production registry: contact, contact_details, transaction, campaign and client.
    pub fn builtin() -> Self {
        Self::empty()
            .with_schema(TableSchema::new("contact", "lvousr.contact", CONTACT_COLUMNS))
            .with_schema(TableSchema::new(
                "contact_details",
                "lvousr.contact_details",
                contact_details_columns(),
            ))
            .with_schema(
                TableSchema::new("transaction", "lvousr.transaction", TRANSACTION_COLUMNS)
                    .with_key("acct_transaction_id"),
            )
            .with_schema(
                TableSchema::new("campaign", "lvousr.campaign", CAMPAIGN_COLUMNS)
                    .with_key("campaign_id"),
            )
            .with_schema(TableSchema::new("client", "lvousr.client", CLIENT_COLUMNS))
            .allow(OperationKind::Select, "client")
            .allow(OperationKind::Select, "contact")
            .allow(OperationKind::Select, "contact_details")
            .allow(OperationKind::Select, "campaign")
            .allow(OperationKind::Insert, "campaign")
            .allow(OperationKind::Insert, "transaction")
    }

    pub fn with_schema(mut self, schema: TableSchema) -> Self {
        self.schemas.insert(schema.name().to_string(), schema);
        self
    }

    pub fn allow(mut self, kind: OperationKind, table: &str) -> Self {
        let table = table.to_lowercase();
        match kind {
            OperationKind::Select => self.select_tables.insert(table),
            OperationKind::Insert => self.insert_tables.insert(table),
        };
        self
    }

    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    /// Case-insensitive schema lookup.
    pub fn get(&self, table: &str) -> Option<&TableSchema> {
        self.schemas.get(&table.trim().to_lowercase())
    }

    /// Fails unless `table` is allowlisted for the given operation kind.
    pub fn validate_table(&self, table: &str, kind: OperationKind) -> Result<(), GuardrailError> {
        let table = table.trim();
        if table.is_empty() {
            return Err(GuardrailError::EmptyTableName);
        }
        let allowed = match kind {
            OperationKind::Select => &self.select_tables,
            OperationKind::Insert => &self.insert_tables,
        };
        if !allowed.contains(&table.to_lowercase()) {
            return Err(GuardrailError::TableNotAllowed {
                table: table.to_string(),
                kind: kind.to_string(),
                allowed: allowed.iter().cloned().collect(),
            });
        }
        Ok(())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_allowlists_are_case_insensitive() {
        let registry = SchemaRegistry::builtin();
        assert!(registry.validate_table("CONTACT", OperationKind::Select).is_ok());
        assert!(registry.validate_table("Campaign", OperationKind::Insert).is_ok());
    }

    #[test]
    fn select_and_insert_allowlists_differ() {
        let registry = SchemaRegistry::builtin();
        assert!(registry.validate_table("transaction", OperationKind::Insert).is_ok());
        assert!(matches!(
            registry.validate_table("transaction", OperationKind::Select),
            Err(GuardrailError::TableNotAllowed { .. })
        ));
        assert!(registry.validate_table("contact", OperationKind::Insert).is_err());
    }

    #[test]
    fn empty_table_name_is_rejected() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(
            registry.validate_table("  ", OperationKind::Select),
            Err(GuardrailError::EmptyTableName)
        );
    }

    #[test]
    fn columns_resolve_to_canonical_lowercase() {
        let registry = SchemaRegistry::builtin();
        let tx = registry.get("TRANSACTION").unwrap();
        assert_eq!(tx.resolve_column("Call_Start_Time"), Some("call_start_time"));
        assert_eq!(tx.resolve_column("not_a_column"), None);
        assert_eq!(tx.key_column(), Some("acct_transaction_id"));
    }

    #[test]
    fn contact_details_has_generic_columns() {
        let registry = SchemaRegistry::builtin();
        let details = registry.get("contact_details").unwrap();
        assert_eq!(details.columns().len(), 103);
        assert!(details.has_column("col100"));
        assert!(!details.has_column("col101"));
    }

    #[test]
    fn registries_can_be_substituted() {
        let registry = SchemaRegistry::empty()
            .with_schema(TableSchema::new("widgets", "app.widgets", ["id", "name"]))
            .allow(OperationKind::Select, "widgets");
        assert!(registry.validate_table("widgets", OperationKind::Select).is_ok());
        assert!(registry.get("contact").is_none());
    }
}
