use crate::campaign::{CampaignCreated, CampaignOrchestrator, CampaignOutcome};
use crate::error::{GatewayError, RoutingError};
use crate::request::{
    CampaignFromQueryRequest, CampaignSelectRequest, CountRequest, CreateCampaignRequest,
    JoinedSelectRequest, RoutedSelectRequest, RoutedTable, SelectRequest,
};
use chrono::{Local, NaiveDateTime};
use configuration::Settings;
use core_types::{DatabaseType, Row, SqlValue};
use database::{
    Backend, BackendClientDirectory, ClientDirectory, ClientLinks, DbError, OracleBackend,
    OracleConnector, PostgresBackend, count_from_rows,
};
use guardrails::{GuardrailError, SchemaRegistry, redact_rows};
use query_builder::{
    DEFAULT_POSTGRES_MARKER, Filter, FilterSet, JoinedSelectSpec, QueryAssembler, SelectSpec,
    classify, resolve_transaction_tables,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Per-process behaviour of the gateway, taken from configuration.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub postgres_marker: String,
    pub archive_count: u32,
    pub redact_results: bool,
    /// Statement timeout for plain Postgres reads.
    pub statement_timeout: Duration,
    /// Statement timeout for Postgres reads over live and archive tables.
    pub routed_statement_timeout: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            postgres_marker: DEFAULT_POSTGRES_MARKER.to_string(),
            archive_count: 2,
            redact_results: true,
            statement_timeout: Duration::from_millis(10_000),
            routed_statement_timeout: Duration::from_millis(30_000),
        }
    }
}

impl GatewayOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            postgres_marker: settings.routing.postgres_marker.clone(),
            archive_count: settings.routing.archive_count,
            redact_results: settings.guardrails.redact_results,
            statement_timeout: Duration::from_millis(settings.postgres.statement_timeout_ms),
            routed_statement_timeout: Duration::from_millis(settings.postgres.routed_statement_timeout_ms),
        }
    }
}

/// A contact and its details row; either may be missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactWithDetails {
    pub contact: Option<Row>,
    pub details: Option<Row>,
}

/// The guarded data-access operations, over whichever backends are configured.
pub struct ContactGateway {
    registry: SchemaRegistry,
    options: GatewayOptions,
    postgres: Option<Arc<dyn Backend>>,
    oracle: Option<Arc<dyn Backend>>,
    directory: Option<Arc<dyn ClientDirectory>>,
    fixed_now: Option<NaiveDateTime>,
}

fn log_built(tool: &'static str, started: Instant) {
    info!(tool, ms = started.elapsed().as_secs_f64() * 1000.0, "built");
}

impl ContactGateway {
    pub fn new(registry: SchemaRegistry, options: GatewayOptions) -> Self {
        Self {
            registry,
            options,
            postgres: None,
            oracle: None,
            directory: None,
            fixed_now: None,
        }
    }

    pub fn with_postgres(mut self, backend: Arc<dyn Backend>) -> Self {
        self.postgres = Some(backend);
        self
    }

    pub fn with_oracle(mut self, backend: Arc<dyn Backend>) -> Self {
        self.oracle = Some(backend);
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn ClientDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Pins the clock used for archive months and campaign filenames.
    pub fn with_fixed_now(mut self, now: NaiveDateTime) -> Self {
        self.fixed_now = Some(now);
        self
    }

    /// Connects every backend the settings describe. A backend without
    /// settings is skipped; operations that need it fail with `NotConfigured`.
    pub async fn connect(settings: &Settings) -> Result<Self, GatewayError> {
        let mut gateway = Self::new(SchemaRegistry::builtin(), GatewayOptions::from_settings(settings));

        if settings.postgres.url.is_some() {
            let pool = database::connect(&settings.postgres).await?;
            let timeout = Duration::from_millis(settings.postgres.statement_timeout_ms);
            gateway = gateway.with_postgres(Arc::new(PostgresBackend::new(pool, timeout)));
            info!("Postgres backend connected");
        } else {
            warn!("postgres.url is not set, Postgres operations are disabled");
        }

        match OracleConnector::from_settings(&settings.oracle) {
            Ok(connector) => {
                info!(connect_string = connector.connect_string(), "Oracle backend configured");
                let oracle: Arc<dyn Backend> = Arc::new(OracleBackend::new(connector));
                let directory = BackendClientDirectory::new(oracle.clone(), settings.oracle.client_table.clone());
                gateway = gateway.with_oracle(oracle).with_directory(Arc::new(directory));
            }
            Err(e) => warn!(error = %e, "Oracle operations are disabled"),
        }

        Ok(gateway)
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    fn now(&self) -> NaiveDateTime {
        self.fixed_now.unwrap_or_else(|| Local::now().naive_local())
    }

    fn backend(&self, database_type: DatabaseType) -> Result<&dyn Backend, GatewayError> {
        let backend = match database_type {
            DatabaseType::Postgres => self.postgres.as_deref(),
            DatabaseType::Oracle => self.oracle.as_deref(),
        };
        backend.ok_or_else(|| DbError::NotConfigured(database_type.as_str()).into())
    }

    fn directory(&self) -> Result<&dyn ClientDirectory, GatewayError> {
        self.directory
            .as_deref()
            .ok_or_else(|| DbError::NotConfigured("oracle").into())
    }

    fn assembler(&self, database_type: DatabaseType) -> QueryAssembler<'_> {
        QueryAssembler::for_database(&self.registry, database_type)
    }

    fn finish(&self, rows: Vec<Row>) -> Vec<Row> {
        if self.options.redact_results {
            redact_rows(rows)
        } else {
            rows
        }
    }

    fn orchestrator(&self) -> Result<CampaignOrchestrator<'_>, GatewayError> {
        Ok(CampaignOrchestrator::new(
            &self.registry,
            self.backend(DatabaseType::Oracle)?,
            self.directory()?,
            &self.options.postgres_marker,
            self.now(),
        ))
    }

    async fn client_links(&self, client_id: i64) -> Result<ClientLinks, GatewayError> {
        if client_id < 1 {
            return Err(GuardrailError::InvalidClientId.into());
        }
        self.directory()?
            .lookup_client_links(client_id)
            .await?
            .ok_or_else(|| RoutingError::ClientNotFound(client_id).into())
    }

    /// Paginated read of an allowlisted Postgres table.
    pub async fn select(&self, request: &SelectRequest) -> Result<Vec<Row>, GatewayError> {
        info!(table = %request.table, "tool:select_records:received");
        let started = Instant::now();
        let spec = SelectSpec {
            filters: FilterSet::from_json(request.filters.as_ref())?,
            columns: request.columns.clone(),
            limit: request.limit,
            offset: request.offset,
            order_by: request.order_by.clone(),
        };
        let query = self.assembler(DatabaseType::Postgres).select(&request.table, &spec, None)?;
        log_built("select_records", started);

        let rows = self
            .backend(DatabaseType::Postgres)?
            .fetch_all(&query, Some(self.options.statement_timeout))
            .await?;
        Ok(self.finish(rows))
    }

    pub async fn count(&self, request: &CountRequest) -> Result<i64, GatewayError> {
        info!(table = %request.table, "tool:count_records:received");
        let filters = FilterSet::from_json(request.filters.as_ref())?;
        let query = self.assembler(DatabaseType::Postgres).count(&request.table, &filters, None)?;
        let rows = self
            .backend(DatabaseType::Postgres)?
            .fetch_all(&query, Some(self.options.statement_timeout))
            .await?;
        Ok(count_from_rows(&rows))
    }

    /// Contacts LEFT JOIN contact details.
    pub async fn select_joined(&self, request: &JoinedSelectRequest) -> Result<Vec<Row>, GatewayError> {
        info!("tool:select_contacts_with_details:received");
        let started = Instant::now();
        let spec = JoinedSelectSpec {
            contact_filters: FilterSet::from_json(request.contact_filters.as_ref())?,
            details_filters: FilterSet::from_json(request.details_filters.as_ref())?,
            contact_columns: request.contact_columns.clone(),
            details_columns: request.details_columns.clone(),
            limit: request.limit,
            offset: request.offset,
            order_by: request.order_by.clone(),
        };
        let query = self.assembler(DatabaseType::Postgres).select_joined(&spec)?;
        log_built("select_contacts_with_details", started);

        let rows = self
            .backend(DatabaseType::Postgres)?
            .fetch_all(&query, Some(self.options.statement_timeout))
            .await?;
        Ok(self.finish(rows))
    }

    /// One contact and its details by `lvaccount_id`.
    pub async fn get_contact_with_details(&self, lvaccount_id: &str) -> Result<ContactWithDetails, GatewayError> {
        info!(lvaccount_id, "tool:get_contact_with_details:received");
        let mut filters = FilterSet::new();
        filters.insert("lvaccount_id", Filter::Equals(SqlValue::Text(lvaccount_id.to_string())));
        let spec = SelectSpec {
            filters,
            limit: Some(1),
            ..SelectSpec::default()
        };

        let assembler = self.assembler(DatabaseType::Postgres);
        let backend = self.backend(DatabaseType::Postgres)?;
        let timeout = Some(self.options.statement_timeout);
        let contact = backend
            .fetch_all(&assembler.select("contact", &spec, None)?, timeout)
            .await?;
        let details = backend
            .fetch_all(&assembler.select("contact_details", &spec, None)?, timeout)
            .await?;

        Ok(ContactWithDetails {
            contact: self.finish(contact).into_iter().next(),
            details: self.finish(details).into_iter().next(),
        })
    }

    /// Reads contacts or transactions from wherever the client's data lives.
    pub async fn select_routed(&self, request: &RoutedSelectRequest) -> Result<Vec<Row>, GatewayError> {
        let tool = request.table.as_str();
        info!(tool, client_id = request.client_id, "tool:select_routed:received");
        let links = self.client_links(request.client_id).await?;
        let database_type = classify(Some(&links.dialing_db), &self.options.postgres_marker);
        info!(db_type = %database_type, dialing_db = %links.dialing_db, "tool:select_routed:db_type");

        let started = Instant::now();
        let assembler = self.assembler(database_type);
        let spec = SelectSpec {
            filters: FilterSet::from_json(request.filters.as_ref())?,
            columns: request.columns.clone(),
            limit: request.limit,
            offset: None,
            order_by: request.order_by.clone(),
        };
        let (query, timeout) = match request.table {
            RoutedTable::Contact => {
                let link = (database_type == DatabaseType::Oracle).then_some(links.dialing_db.as_str());
                (assembler.select("contact", &spec, link)?, self.options.statement_timeout)
            }
            RoutedTable::Transaction => {
                let tables = resolve_transaction_tables(
                    &links.dialing_db,
                    links.reporting_db.as_deref(),
                    self.options.archive_count,
                    self.now().date(),
                )?;
                (
                    assembler.union_select("transaction", &tables, &spec)?,
                    self.options.routed_statement_timeout,
                )
            }
        };
        log_built("select_routed", started);

        // Oracle sessions keep the connector's call timeout.
        let timeout = (database_type == DatabaseType::Postgres).then_some(timeout);
        let rows = self.backend(database_type)?.fetch_all(&query, timeout).await?;
        Ok(self.finish(rows))
    }

    /// Campaigns in the Oracle configuration database.
    pub async fn select_campaigns(&self, request: &CampaignSelectRequest) -> Result<Vec<Row>, GatewayError> {
        info!(filters = ?request.filters, "tool:select_campaigns:received");
        let started = Instant::now();
        let spec = SelectSpec {
            filters: FilterSet::from_json(request.filters.as_ref())?,
            columns: request.columns.clone(),
            limit: request.limit,
            offset: None,
            order_by: request.order_by.clone(),
        };
        let query = self.assembler(DatabaseType::Oracle).select("campaign", &spec, None)?;
        log_built("select_campaigns", started);

        let rows = self.backend(DatabaseType::Oracle)?.fetch_all(&query, None).await?;
        Ok(self.finish(rows))
    }

    pub async fn create_campaign(&self, request: &CreateCampaignRequest) -> Result<CampaignCreated, GatewayError> {
        self.orchestrator()?.create_campaign(request).await
    }

    pub async fn create_campaign_from_query(
        &self,
        request: &CampaignFromQueryRequest,
    ) -> Result<CampaignOutcome, GatewayError> {
        self.orchestrator()?.create_from_query(request).await
    }

    /// The physical transaction tables a routed read would cover, without reading them.
    pub async fn resolve_tables(&self, client_id: i64) -> Result<Vec<String>, GatewayError> {
        let links = self.client_links(client_id).await?;
        Ok(resolve_transaction_tables(
            &links.dialing_db,
            links.reporting_db.as_deref(),
            self.options.archive_count,
            self.now().date(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeBackend, FakeDirectory};
    use chrono::NaiveDate;
    use core_types::Params;
    use guardrails::REDACTION_SENTINEL;
    use query_builder::QueryError;
    use serde_json::{Value as JsonValue, json};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 18).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn gateway(postgres: &Arc<FakeBackend>, oracle: &Arc<FakeBackend>, directory: FakeDirectory) -> ContactGateway {
        ContactGateway::new(SchemaRegistry::builtin(), GatewayOptions::default())
            .with_postgres(postgres.clone())
            .with_oracle(oracle.clone())
            .with_directory(Arc::new(directory))
            .with_fixed_now(now())
    }

    fn routed(client_id: i64, table: RoutedTable, filters: JsonValue) -> RoutedSelectRequest {
        RoutedSelectRequest {
            client_id,
            table,
            filters: Some(filters),
            columns: None,
            limit: None,
            order_by: None,
        }
    }

    #[tokio::test]
    async fn select_redacts_and_sets_the_statement_timeout() {
        let postgres = Arc::new(FakeBackend::postgres().with_reads(vec![vec![json!({"account": "A1", "ssn": "123-45-6789"})]]));
        let oracle = Arc::new(FakeBackend::oracle());
        let gateway = gateway(&postgres, &oracle, FakeDirectory::new());

        let rows = gateway
            .select(&SelectRequest {
                table: "contact".into(),
                filters: Some(json!({"state": "TX"})),
                ..SelectRequest::default()
            })
            .await
            .unwrap();

        assert_eq!(rows[0]["account"], json!("A1"));
        assert_eq!(rows[0]["ssn"], json!(REDACTION_SENTINEL));
        assert_eq!(postgres.timeouts(), vec![Some(Duration::from_millis(10_000))]);
        assert_eq!(
            postgres.statements()[0].sql,
            "SELECT * FROM lvousr.contact WHERE state = $1 LIMIT $2 OFFSET $3"
        );
    }

    #[tokio::test]
    async fn invalid_columns_never_reach_a_backend() {
        let postgres = Arc::new(FakeBackend::postgres());
        let oracle = Arc::new(FakeBackend::oracle());
        let gateway = gateway(&postgres, &oracle, FakeDirectory::new());

        let result = gateway
            .count(&CountRequest {
                table: "contact".into(),
                filters: Some(json!({"no_such_column": 1})),
            })
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Validation(QueryError::UnknownFilterColumn { .. }))
        ));

        let result = gateway
            .select(&SelectRequest {
                table: "contact".into(),
                order_by: Some("no_such_column DESC".into()),
                ..SelectRequest::default()
            })
            .await;
        assert!(matches!(result, Err(GatewayError::Validation(_))));
        assert!(postgres.statements().is_empty());
    }

    #[tokio::test]
    async fn postgres_union_repeats_params_per_branch() {
        let postgres = Arc::new(FakeBackend::postgres());
        let oracle = Arc::new(FakeBackend::oracle());
        let directory = FakeDirectory::new().with_client(7, "tenant_POSTGRES_1", Some("rep_postgres"));
        let gateway = gateway(&postgres, &oracle, directory);

        gateway
            .select_routed(&routed(7, RoutedTable::Transaction, json!({"outcome": "FAILED"})))
            .await
            .unwrap();

        let statement = &postgres.statements()[0];
        assert_eq!(
            statement.params,
            Params::Positional(vec![
                "FAILED".into(),
                "FAILED".into(),
                "FAILED".into(),
                SqlValue::Int(100),
            ])
        );
        assert!(statement.sql.contains("lvousr.transaction_0126"));
        assert!(statement.sql.contains("lvousr.transaction_1225"));
        assert_eq!(postgres.timeouts(), vec![Some(Duration::from_millis(30_000))]);
        assert!(oracle.statements().is_empty());
    }

    #[tokio::test]
    async fn oracle_union_binds_each_name_once() {
        let postgres = Arc::new(FakeBackend::postgres());
        let oracle = Arc::new(FakeBackend::oracle());
        let directory = FakeDirectory::new().with_client(7, "DIAL01", Some("REP01"));
        let gateway = gateway(&postgres, &oracle, directory);

        gateway
            .select_routed(&routed(7, RoutedTable::Transaction, json!({"outcome": "FAILED"})))
            .await
            .unwrap();

        let statement = &oracle.statements()[0];
        assert_eq!(statement.sql.matches(" UNION ALL ").count(), 2);
        assert_eq!(
            statement.params,
            Params::Named(vec![
                ("p1".into(), "FAILED".into()),
                ("limit".into(), SqlValue::Int(100)),
            ])
        );
        assert!(statement.sql.contains("LVOUSR.TRANSACTION_0126@REP01"));
        assert_eq!(oracle.timeouts(), vec![None]);
    }

    #[tokio::test]
    async fn oracle_contacts_are_read_over_the_dialing_link() {
        let postgres = Arc::new(FakeBackend::postgres());
        let oracle = Arc::new(FakeBackend::oracle());
        let directory = FakeDirectory::new().with_client(7, "DIAL01", None);
        let gateway = gateway(&postgres, &oracle, directory);

        gateway
            .select_routed(&routed(7, RoutedTable::Contact, json!({"state": "TX"})))
            .await
            .unwrap();
        assert!(oracle.statements()[0].sql.starts_with("SELECT * FROM LVOUSR.CONTACT@DIAL01 WHERE STATE = :p1"));

        let missing = gateway.select_routed(&routed(8, RoutedTable::Contact, json!({}))).await;
        assert!(matches!(missing, Err(GatewayError::Routing(RoutingError::ClientNotFound(8)))));
        let invalid = gateway.select_routed(&routed(0, RoutedTable::Contact, json!({}))).await;
        assert!(matches!(invalid, Err(GatewayError::Guardrail(GuardrailError::InvalidClientId))));
    }

    #[tokio::test]
    async fn unconfigured_backends_fail_explicitly() {
        let gateway = ContactGateway::new(SchemaRegistry::builtin(), GatewayOptions::default());
        let request = SelectRequest {
            table: "contact".into(),
            ..SelectRequest::default()
        };
        let result = gateway.select(&request);
        assert!(matches!(
            result.await,
            Err(GatewayError::Backend(DbError::NotConfigured("postgres")))
        ));
    }

    #[tokio::test]
    async fn contact_with_details_tolerates_a_missing_details_row() {
        let postgres = Arc::new(FakeBackend::postgres().with_reads(vec![vec![json!({"lvaccount_id": "L1"})], vec![]]));
        let oracle = Arc::new(FakeBackend::oracle());
        let gateway = gateway(&postgres, &oracle, FakeDirectory::new());

        let found = gateway.get_contact_with_details("L1").await.unwrap();
        assert_eq!(found.contact.unwrap()["lvaccount_id"], json!("L1"));
        assert_eq!(found.details, None);
        assert_eq!(
            postgres.statements()[1].sql,
            "SELECT * FROM lvousr.contact_details WHERE lvaccount_id = $1 LIMIT $2 OFFSET $3"
        );
    }

    #[tokio::test]
    async fn joined_select_redacts_explicitly_requested_columns() {
        let postgres = Arc::new(FakeBackend::postgres().with_reads(vec![vec![json!({
            "contact_account": "A1",
            "contact_ssn": "123-45-6789",
            "details_col1": "gold",
        })]]));
        let oracle = Arc::new(FakeBackend::oracle());
        let gateway = gateway(&postgres, &oracle, FakeDirectory::new());

        let rows = gateway
            .select_joined(&JoinedSelectRequest {
                contact_columns: Some(vec!["account".into(), "ssn".into()]),
                details_columns: Some(vec!["col1".into()]),
                ..JoinedSelectRequest::default()
            })
            .await
            .unwrap();

        assert!(postgres.statements()[0].sql.starts_with(
            "SELECT c.account AS contact_account, c.ssn AS contact_ssn, d.col1 AS details_col1 FROM"
        ));
        assert_eq!(rows[0]["contact_account"], json!("A1"));
        assert_eq!(rows[0]["contact_ssn"], json!(REDACTION_SENTINEL));
        assert_eq!(rows[0]["details_col1"], json!("gold"));
    }

    #[tokio::test]
    async fn contact_with_details_is_redacted() {
        let postgres = Arc::new(FakeBackend::postgres().with_reads(vec![
            vec![json!({"lvaccount_id": "L1", "ssn": "123-45-6789", "dob": "1990-01-01"})],
            vec![json!({"lvaccount_id": "L1", "col1": "gold"})],
        ]));
        let oracle = Arc::new(FakeBackend::oracle());
        let gateway = gateway(&postgres, &oracle, FakeDirectory::new());

        let found = gateway.get_contact_with_details("L1").await.unwrap();
        let contact = found.contact.unwrap();
        assert_eq!(contact["lvaccount_id"], json!("L1"));
        assert_eq!(contact["ssn"], json!(REDACTION_SENTINEL));
        assert_eq!(contact["dob"], json!(REDACTION_SENTINEL));
        assert_eq!(found.details.unwrap()["col1"], json!("gold"));
    }

    #[tokio::test]
    async fn postgres_filters_keep_date_like_text() {
        let postgres = Arc::new(FakeBackend::postgres());
        let oracle = Arc::new(FakeBackend::oracle());
        let gateway = gateway(&postgres, &oracle, FakeDirectory::new());

        gateway
            .select(&SelectRequest {
                table: "contact".into(),
                filters: Some(json!({"account": "2026-01-01"})),
                ..SelectRequest::default()
            })
            .await
            .unwrap();

        assert_eq!(
            postgres.statements()[0].params,
            Params::Positional(vec![
                SqlValue::Text("2026-01-01".into()),
                SqlValue::Int(100),
                SqlValue::Int(0),
            ])
        );
    }

    #[tokio::test]
    async fn campaigns_are_read_from_the_config_database() {
        let postgres = Arc::new(FakeBackend::postgres());
        let oracle = Arc::new(FakeBackend::oracle());
        let gateway = gateway(&postgres, &oracle, FakeDirectory::new());

        gateway
            .select_campaigns(&CampaignSelectRequest {
                filters: Some(json!({"b_active": 1})),
                order_by: Some("create_date desc".into()),
                limit: Some(5),
                ..CampaignSelectRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(
            oracle.statements()[0].sql,
            "SELECT * FROM LVOUSR.CAMPAIGN WHERE B_ACTIVE = :p1 ORDER BY CREATE_DATE DESC FETCH FIRST :limit ROWS ONLY"
        );
    }

    #[tokio::test]
    async fn archive_tables_follow_the_clock() {
        let postgres = Arc::new(FakeBackend::postgres());
        let oracle = Arc::new(FakeBackend::oracle());
        let gateway = gateway(&postgres, &oracle, FakeDirectory::new().with_client(3, "D", Some("R")));

        assert_eq!(
            gateway.resolve_tables(3).await.unwrap(),
            vec![
                "LVOUSR.TRANSACTION@D".to_string(),
                "LVOUSR.TRANSACTION_0126@R".to_string(),
                "LVOUSR.TRANSACTION_1225@R".to_string(),
            ]
        );
    }
}
