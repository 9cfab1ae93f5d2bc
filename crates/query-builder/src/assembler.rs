use crate::binder::Binder;
use crate::date::coerce_date;
use crate::dialect::{Dialect, dialect_for};
use crate::error::QueryError;
use crate::filter::{FilterSet, Predicate};
use crate::order::OrderBy;
use core_types::{BuiltQuery, DatabaseType, GeneratedKey, SqlValue};
use guardrails::{
    CampaignRecord, GuardrailError, OperationKind, SchemaRegistry, TableSchema, is_explicit_only,
};
use tracing::debug;

/// Output bind that receives a new campaign's id.
pub const CAMPAIGN_KEY_BIND: &str = "out_campaign_id";

const CAMPAIGN_TABLE: &str = "campaign";
const CONTACT_TABLE: &str = "contact";
const DETAILS_TABLE: &str = "contact_details";
const JOIN_KEY: &str = "lvaccount_id";

/// Campaign columns holding timestamps; date-like text is coerced where the dialect does so.
const CAMPAIGN_TIME_COLUMNS: &[&str] = &["start_time", "end_time"];

/// Inputs shared by every paginated read.
#[derive(Debug, Clone, Default)]
pub struct SelectSpec {
    pub filters: FilterSet,
    pub columns: Option<Vec<String>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Option<String>,
}

/// Inputs of the contact / contact-details LEFT JOIN.
#[derive(Debug, Clone, Default)]
pub struct JoinedSelectSpec {
    pub contact_filters: FilterSet,
    pub details_filters: FilterSet,
    pub contact_columns: Option<Vec<String>>,
    pub details_columns: Option<Vec<String>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Ordering is by a contact column only.
    pub order_by: Option<String>,
}

/// Builds every statement the gateway runs, for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct QueryAssembler<'a> {
    registry: &'a SchemaRegistry,
    dialect: &'a dyn Dialect,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(registry: &'a SchemaRegistry, dialect: &'a dyn Dialect) -> Self {
        Self { registry, dialect }
    }

    pub fn for_database(registry: &'a SchemaRegistry, database_type: DatabaseType) -> Self {
        Self::new(registry, dialect_for(database_type))
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    fn schema(&self, table: &str) -> Result<&'a TableSchema, QueryError> {
        self.registry
            .get(table)
            .ok_or_else(|| QueryError::UnknownTable(table.to_string()))
    }

    /// Validates a table for the operation kind and returns its schema.
    fn allowed_schema(&self, table: &str, kind: OperationKind) -> Result<&'a TableSchema, QueryError> {
        self.registry.validate_table(table, kind)?;
        self.schema(table)
    }

    /// Canonical column names for a projection; `None` means "all columns".
    fn resolve_columns(
        &self,
        schema: &TableSchema,
        columns: Option<&[String]>,
    ) -> Result<Option<Vec<String>>, QueryError> {
        let Some(columns) = columns.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        let mut resolved = Vec::with_capacity(columns.len());
        let mut invalid = Vec::new();
        for column in columns {
            match schema.resolve_column(column) {
                Some(canonical) => resolved.push(canonical.to_string()),
                None => invalid.push(column.trim().to_string()),
            }
        }
        if !invalid.is_empty() {
            return Err(QueryError::UnknownColumns {
                table: schema.name().to_string(),
                columns: invalid,
            });
        }
        Ok(Some(resolved))
    }

    fn projection(&self, schema: &TableSchema, columns: Option<&[String]>) -> Result<String, QueryError> {
        Ok(match self.resolve_columns(schema, columns)? {
            None => "*".to_string(),
            Some(columns) => columns
                .iter()
                .map(|c| self.dialect.ident(c))
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    fn predicate(&self, schema: &TableSchema, filters: &FilterSet) -> Result<Predicate, QueryError> {
        Predicate::translate(
            filters,
            schema,
            self.registry.limits(),
            self.dialect.coerces_date_strings(),
        )
    }

    fn where_clause(&self, predicate: &Predicate, alias: Option<&str>, binder: &mut Binder) -> String {
        predicate
            .render(self.dialect, alias, binder)
            .map(|clauses| format!(" WHERE {clauses}"))
            .unwrap_or_default()
    }

    fn order_clause(&self, order: Option<&OrderBy>, alias: Option<&str>) -> String {
        match order {
            None => String::new(),
            Some(order) => {
                let column = self.dialect.ident(order.column());
                match alias {
                    Some(alias) => format!(" ORDER BY {alias}.{column} {}", order.direction()),
                    None => format!(" ORDER BY {column} {}", order.direction()),
                }
            }
        }
    }

    /// The row count one statement may return: validated, then capped per page.
    fn page_limit(&self, limit: Option<i64>) -> Result<i64, QueryError> {
        let limits = self.registry.limits();
        Ok(limits.clamp_page(limits.validate_limit(limit)?))
    }

    /// `SELECT cols FROM table [WHERE ..] [ORDER BY ..] <limit>` on an allowlisted table.
    pub fn select(&self, table: &str, spec: &SelectSpec, db_link: Option<&str>) -> Result<BuiltQuery, QueryError> {
        let schema = self.allowed_schema(table, OperationKind::Select)?;
        let projection = self.projection(schema, spec.columns.as_deref())?;
        let predicate = self.predicate(schema, &spec.filters)?;
        let order = OrderBy::parse_opt(spec.order_by.as_deref(), schema)?;
        let limit = self.page_limit(spec.limit)?;
        let offset = self.registry.limits().validate_offset(spec.offset)?;

        let mut binder = self.dialect.binder();
        let sql = format!(
            "SELECT {projection} FROM {}{}{}{}",
            self.dialect.table_name(schema.physical(), db_link),
            self.where_clause(&predicate, None, &mut binder),
            self.order_clause(order.as_ref(), None),
            self.dialect.limit_clause(limit, Some(offset), &mut binder),
        );
        debug!(table = schema.name(), dialect = self.dialect.name(), "built select");
        Ok(BuiltQuery::new(sql, binder.into_params()))
    }

    /// `SELECT COUNT(*) AS count FROM table [WHERE ..]` on an allowlisted table.
    pub fn count(&self, table: &str, filters: &FilterSet, db_link: Option<&str>) -> Result<BuiltQuery, QueryError> {
        let schema = self.allowed_schema(table, OperationKind::Select)?;
        let predicate = self.predicate(schema, filters)?;

        let mut binder = self.dialect.binder();
        let sql = format!(
            "SELECT COUNT(*) AS count FROM {}{}",
            self.dialect.table_name(schema.physical(), db_link),
            self.where_clause(&predicate, None, &mut binder),
        );
        Ok(BuiltQuery::new(sql, binder.into_params()))
    }

    /// Aliased projection for one side of the join. A wildcard expands to the
    /// sorted column list, minus columns that must be asked for by name.
    fn joined_projection(
        &self,
        schema: &TableSchema,
        columns: Option<&[String]>,
        alias: &str,
        prefix: &str,
    ) -> Result<Vec<String>, QueryError> {
        let columns = match self.resolve_columns(schema, columns)? {
            Some(columns) => columns,
            None => {
                let mut all: Vec<String> = schema
                    .columns()
                    .iter()
                    .filter(|c| !is_explicit_only(c))
                    .cloned()
                    .collect();
                all.sort();
                all
            }
        };
        Ok(columns
            .iter()
            .map(|c| {
                format!(
                    "{alias}.{} AS {}",
                    self.dialect.ident(c),
                    self.dialect.ident(&format!("{prefix}_{c}"))
                )
            })
            .collect())
    }

    /// Contacts LEFT JOINed with their details, one row per contact.
    pub fn select_joined(&self, spec: &JoinedSelectSpec) -> Result<BuiltQuery, QueryError> {
        let contact = self.allowed_schema(CONTACT_TABLE, OperationKind::Select)?;
        let details = self.allowed_schema(DETAILS_TABLE, OperationKind::Select)?;

        let mut projection =
            self.joined_projection(contact, spec.contact_columns.as_deref(), "c", "contact")?;
        projection.extend(self.joined_projection(
            details,
            spec.details_columns.as_deref(),
            "d",
            "details",
        )?);

        let contact_predicate = self.predicate(contact, &spec.contact_filters)?;
        let details_predicate = self.predicate(details, &spec.details_filters)?;
        let order = OrderBy::parse_opt(spec.order_by.as_deref(), contact)?;
        let limit = self.page_limit(spec.limit)?;
        let offset = self.registry.limits().validate_offset(spec.offset)?;

        let mut binder = self.dialect.binder();
        let clauses: Vec<String> = [
            contact_predicate.render(self.dialect, Some("c"), &mut binder),
            details_predicate.render(self.dialect, Some("d"), &mut binder),
        ]
        .into_iter()
        .flatten()
        .collect();
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let key = self.dialect.ident(JOIN_KEY);
        let sql = format!(
            "SELECT {} FROM {} c LEFT JOIN {} d ON c.{key} = d.{key}{where_sql}{}{}",
            projection.join(", "),
            self.dialect.table_name(contact.physical(), None),
            self.dialect.table_name(details.physical(), None),
            self.order_clause(order.as_ref(), Some("c")),
            self.dialect.limit_clause(limit, Some(offset), &mut binder),
        );
        Ok(BuiltQuery::new(sql, binder.into_params()))
    }

    /// One `SELECT .. FROM t WHERE ..` per table, joined by `UNION ALL`.
    ///
    /// Numbered-placeholder dialects re-render the predicate per branch, so
    /// the parameters repeat once per table; named dialects reuse one set.
    fn union_branches(
        &self,
        tables: &[String],
        projection: &str,
        predicate: &Predicate,
        binder: &mut Binder,
    ) -> Result<String, QueryError> {
        if tables.is_empty() {
            return Err(QueryError::NoTables);
        }
        let shared_where = if self.dialect.repeats_params_per_branch() {
            None
        } else {
            Some(self.where_clause(predicate, None, binder))
        };

        let branches: Vec<String> = tables
            .iter()
            .map(|table| {
                let where_sql = match &shared_where {
                    Some(shared) => shared.clone(),
                    None => self.where_clause(predicate, None, binder),
                };
                format!(
                    "SELECT {projection} FROM {}{where_sql}",
                    self.dialect.localize_table(table)
                )
            })
            .collect();
        Ok(branches.join(" UNION ALL "))
    }

    /// Reads `table`'s schema across several physical tables (live plus archives).
    /// Historical reads do not paginate; any offset in `spec` is ignored.
    pub fn union_select(&self, table: &str, tables: &[String], spec: &SelectSpec) -> Result<BuiltQuery, QueryError> {
        let schema = self.schema(table)?;
        let projection = self.projection(schema, spec.columns.as_deref())?;
        let predicate = self.predicate(schema, &spec.filters)?;
        let order = OrderBy::parse_opt(spec.order_by.as_deref(), schema)?;
        let limit = self.page_limit(spec.limit)?;

        let mut binder = self.dialect.binder();
        let union_sql = self.union_branches(tables, &projection, &predicate, &mut binder)?;
        let sql = format!(
            "SELECT * FROM ({union_sql}){}{}{}",
            self.dialect.derived_table_alias(),
            self.order_clause(order.as_ref(), None),
            self.dialect.limit_clause(limit, None, &mut binder),
        );
        debug!(table = schema.name(), branches = tables.len(), "built union select");
        Ok(BuiltQuery::new(sql, binder.into_params()))
    }

    /// Counts matching rows across `tables`. A single table is counted directly.
    pub fn union_count(&self, table: &str, tables: &[String], filters: &FilterSet) -> Result<BuiltQuery, QueryError> {
        let schema = self.schema(table)?;
        let predicate = self.predicate(schema, filters)?;
        let mut binder = self.dialect.binder();

        let sql = match tables {
            [] => return Err(QueryError::NoTables),
            [single] => format!(
                "SELECT COUNT(*) AS count FROM {}{}",
                self.dialect.localize_table(single),
                self.where_clause(&predicate, None, &mut binder),
            ),
            _ => format!(
                "SELECT COUNT(*) AS count FROM ({}){}",
                self.union_branches(tables, "*", &predicate, &mut binder)?,
                self.dialect.derived_table_alias(),
            ),
        };
        Ok(BuiltQuery::new(sql, binder.into_params()))
    }

    /// Parameterized campaign INSERT that hands back the generated campaign id.
    pub fn campaign_insert(&self, record: &CampaignRecord) -> Result<(BuiltQuery, GeneratedKey), QueryError> {
        let schema = self.allowed_schema(CAMPAIGN_TABLE, OperationKind::Insert)?;
        let key_column = schema.key_column().unwrap_or("campaign_id");

        let mut binder = self.dialect.binder();
        let mut columns = Vec::with_capacity(record.fields().len());
        let mut placeholders = Vec::with_capacity(record.fields().len());
        for (column, raw) in record.fields() {
            let canonical = schema
                .resolve_column(column)
                .ok_or_else(|| GuardrailError::DisallowedColumns(vec![column.clone()]))?;
            let mut value = SqlValue::from_json(raw)?;
            if self.dialect.coerces_date_strings() && CAMPAIGN_TIME_COLUMNS.contains(&canonical) {
                value = coerce_date(value);
            }
            columns.push(self.dialect.ident(canonical));
            placeholders.push(binder.bind_named(canonical, value));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}){}",
            self.dialect.table_name(schema.physical(), None),
            columns.join(", "),
            placeholders.join(", "),
            self.dialect.returning_clause(key_column, CAMPAIGN_KEY_BIND),
        );
        Ok((
            BuiltQuery::new(sql, binder.into_params()),
            GeneratedKey::new(key_column, CAMPAIGN_KEY_BIND),
        ))
    }

    /// `INSERT INTO table@link (cols) SELECT cols FROM (SELECT * FROM table@link WHERE ..)`
    /// with the new campaign id written as a literal into every copied row.
    pub fn derived_insert(
        &self,
        table: &str,
        db_link: &str,
        filters: &FilterSet,
        campaign_id: i64,
        max_records: Option<i64>,
    ) -> Result<BuiltQuery, QueryError> {
        let schema = self.allowed_schema(table, OperationKind::Insert)?;
        let predicate = self.predicate(schema, filters)?;
        let max_records = match max_records {
            Some(n) if n < 1 => return Err(GuardrailError::InvalidLimit.into()),
            other => other,
        };

        let copied: Vec<&String> = schema
            .columns()
            .iter()
            .filter(|c| Some(c.as_str()) != schema.key_column())
            .collect();
        let target_columns: Vec<String> = copied.iter().map(|c| self.dialect.ident(c)).collect();
        let source_columns: Vec<String> = copied
            .iter()
            .map(|c| match c.as_str() {
                "campaign_id" => campaign_id.to_string(),
                other => self.dialect.ident(other),
            })
            .collect();

        let qualified = self.dialect.table_name(schema.physical(), Some(db_link));
        let mut binder = self.dialect.binder();
        let where_sql = self.where_clause(&predicate, None, &mut binder);
        let row_limit = max_records
            .map(|n| {
                let placeholder = binder.bind_named("max_records", SqlValue::Int(n));
                self.dialect.fetch_first(&placeholder)
            })
            .unwrap_or_default();

        let sql = format!(
            "INSERT INTO {qualified} ({}) SELECT {} FROM (SELECT * FROM {qualified}{where_sql}{row_limit}){}",
            target_columns.join(", "),
            source_columns.join(", "),
            self.dialect.derived_table_alias(),
        );
        Ok(BuiltQuery::new(sql, binder.into_params()))
    }
}
