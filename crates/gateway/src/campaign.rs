use crate::error::{GatewayError, RoutingError};
use crate::request::{CampaignFromQueryRequest, CreateCampaignRequest};
use chrono::NaiveDateTime;
use core_types::{DatabaseType, SqlValue};
use database::{Backend, ClientDirectory, ClientLinks, count_from_rows};
use guardrails::{GuardrailError, SchemaRegistry, validate_campaign_insert};
use query_builder::{
    Filter, FilterOp, FilterSet, Operand, QueryAssembler, classify, resolve_transaction_tables,
};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};
use std::fmt;
use tracing::{error, info};

const TRANSACTION_TABLE: &str = "transaction";
/// The transaction column that actually holds a skill id.
const SKILL_COLUMN: &str = "client_id";

/// Where a campaign-from-query run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignStage {
    ResolveRouting,
    DetermineSkills,
    CountCandidates,
    CreateCampaign,
    InsertDerivedRows,
    Done,
}

impl fmt::Display for CampaignStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CampaignStage::ResolveRouting => "resolve_routing",
            CampaignStage::DetermineSkills => "determine_skills",
            CampaignStage::CountCandidates => "count_candidates",
            CampaignStage::CreateCampaign => "create_campaign",
            CampaignStage::InsertDerivedRows => "insert_derived_rows",
            CampaignStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result payload of `create_campaign_from_query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<i64>,
    pub client_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<JsonValue>,
    pub records_found: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_inserted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_filters: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result payload of a standalone `create_campaign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignCreated {
    pub success: bool,
    pub campaign_id: i64,
    pub client_id: i64,
}

/// Runs campaign workflows against the Oracle configuration database.
///
/// Campaign creation and the derived insert are two separate commits. If the
/// second fails the campaign is left without records and its id is returned
/// in [`GatewayError::OrphanedCampaign`].
pub struct CampaignOrchestrator<'a> {
    registry: &'a SchemaRegistry,
    backend: &'a dyn Backend,
    directory: &'a dyn ClientDirectory,
    postgres_marker: &'a str,
    now: NaiveDateTime,
}

impl<'a> CampaignOrchestrator<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        backend: &'a dyn Backend,
        directory: &'a dyn ClientDirectory,
        postgres_marker: &'a str,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            registry,
            backend,
            directory,
            postgres_marker,
            now,
        }
    }

    fn assembler(&self) -> QueryAssembler<'a> {
        QueryAssembler::for_database(self.registry, DatabaseType::Oracle)
    }

    fn enter(&self, stage: CampaignStage, client_id: i64) {
        info!(%stage, client_id, "campaign:stage");
    }

    async fn client_links(&self, client_id: i64) -> Result<ClientLinks, GatewayError> {
        if client_id < 1 {
            return Err(GuardrailError::InvalidClientId.into());
        }
        self.directory
            .lookup_client_links(client_id)
            .await?
            .ok_or_else(|| RoutingError::ClientNotFound(client_id).into())
    }

    /// Validates the record, checks the client exists, and inserts it.
    pub async fn create_campaign(&self, request: &CreateCampaignRequest) -> Result<CampaignCreated, GatewayError> {
        info!(client_id = request.client_id, "tool:create_campaign:received");
        let mut data = request.data.clone();
        data.insert("client_id".to_string(), json!(request.client_id));
        let record = validate_campaign_insert(&data)?;

        self.client_links(request.client_id).await?;

        let (insert, key) = self.assembler().campaign_insert(&record)?;
        let campaign_id = self.backend.insert_returning_key(&insert, &key).await?;
        info!(campaign_id, "tool:create_campaign:created");

        Ok(CampaignCreated {
            success: true,
            campaign_id,
            client_id: request.client_id,
        })
    }

    /// Counts the transactions matching `query_filters`; when there are any,
    /// creates a campaign and copies those transactions into it.
    pub async fn create_from_query(&self, request: &CampaignFromQueryRequest) -> Result<CampaignOutcome, GatewayError> {
        let client_id = request.client_id;
        info!(client_id, "tool:create_campaign_from_query:received");
        if matches!(request.max_records, Some(n) if n < 1) {
            return Err(GuardrailError::InvalidLimit.into());
        }

        self.enter(CampaignStage::ResolveRouting, client_id);
        let links = self.client_links(client_id).await?;
        let backend = classify(Some(&links.dialing_db), self.postgres_marker);
        if backend != DatabaseType::Oracle {
            return Err(RoutingError::UnsupportedBackend {
                operation: "create_campaign_from_query",
                backend,
            }
            .into());
        }
        // Archives are reporting-only; campaigns are built from the live table.
        let tables = resolve_transaction_tables(&links.dialing_db, None, 0, self.now.date())?;
        info!(dialing_db = %links.dialing_db, ?tables, "tool:create_campaign_from_query:tables");

        self.enter(CampaignStage::DetermineSkills, client_id);
        let mut filters = FilterSet::from_map(&request.query_filters)?;
        let skill_id = self.scope_to_skills(client_id, &mut filters).await?;

        self.enter(CampaignStage::CountCandidates, client_id);
        let assembler = self.assembler();
        let count = assembler.union_count(TRANSACTION_TABLE, &tables, &filters)?;
        let records_found = count_from_rows(&self.backend.fetch_all(&count, None).await?);
        info!(records = records_found, "tool:create_campaign_from_query:count");

        if records_found == 0 {
            return Ok(CampaignOutcome {
                success: false,
                campaign_id: None,
                client_id,
                skill_id,
                records_found: 0,
                records_inserted: None,
                query_filters: Some(filters.to_json()),
                error: Some("No records match the query criteria. Campaign not created.".to_string()),
            });
        }

        self.enter(CampaignStage::CreateCampaign, client_id);
        let record = validate_campaign_insert(&self.campaign_data(request, skill_id.as_ref()))?;
        let (insert, key) = assembler.campaign_insert(&record)?;
        let campaign_id = self.backend.insert_returning_key(&insert, &key).await?;
        info!(campaign_id, "tool:create_campaign_from_query:campaign_created");

        self.enter(CampaignStage::InsertDerivedRows, client_id);
        let records_inserted = self
            .insert_rows(&links.dialing_db, &filters, campaign_id, request.max_records)
            .await
            .map_err(|source| {
                error!(campaign_id, error = %source, "derived insert failed, campaign has no records");
                GatewayError::OrphanedCampaign {
                    campaign_id,
                    source: Box::new(source),
                }
            })?;

        self.enter(CampaignStage::Done, client_id);
        info!(rows_inserted = records_inserted, "tool:create_campaign_from_query:complete");

        Ok(CampaignOutcome {
            success: true,
            campaign_id: Some(campaign_id),
            client_id,
            skill_id,
            records_found,
            records_inserted: Some(records_inserted),
            query_filters: Some(filters.to_json()),
            error: None,
        })
    }

    /// Leaves a caller-supplied skill filter alone; otherwise restricts the
    /// filters to the client's skills. Returns the skill the campaign gets.
    async fn scope_to_skills(&self, client_id: i64, filters: &mut FilterSet) -> Result<Option<JsonValue>, GatewayError> {
        if let Some(filter) = filters.get(SKILL_COLUMN) {
            let skill = skill_from_filter(filter);
            info!(skill_id = ?skill, "tool:create_campaign_from_query:skill_from_filter");
            return Ok(skill);
        }

        let skills = self.directory.lookup_skills(client_id).await?;
        info!(skill_ids = ?skills, "tool:create_campaign_from_query:skills_for_client");
        let filter = match skills.as_slice() {
            [] => return Err(RoutingError::NoSkills(client_id).into()),
            [single] => Filter::Equals(SqlValue::Int(*single)),
            many => Filter::new(SKILL_COLUMN, FilterOp::In, Some(&json!(many)))?,
        };
        filters.insert(SKILL_COLUMN, filter);
        Ok(skills.first().map(|s| json!(s)))
    }

    /// Caller settings plus the real client id, the skill, and a filename.
    fn campaign_data(&self, request: &CampaignFromQueryRequest, skill_id: Option<&JsonValue>) -> Map<String, JsonValue> {
        let mut data = request.campaign_data.clone().unwrap_or_default();
        let has = |data: &Map<String, JsonValue>, column: &str| {
            data.keys().any(|k| k.trim().eq_ignore_ascii_case(column))
        };

        data.retain(|k, _| !k.trim().eq_ignore_ascii_case("client_id"));
        data.insert("client_id".to_string(), json!(request.client_id));
        if let Some(skill_id) = skill_id {
            if !has(&data, "skill_id") {
                data.insert("skill_id".to_string(), skill_id.clone());
            }
        }
        if !has(&data, "filename") {
            let filename = format!("auto_campaign_{}", self.now.format("%Y%m%d_%H%M%S"));
            data.insert("filename".to_string(), JsonValue::String(filename));
        }
        data
    }

    async fn insert_rows(
        &self,
        dialing_db: &str,
        filters: &FilterSet,
        campaign_id: i64,
        max_records: Option<i64>,
    ) -> Result<u64, GatewayError> {
        let insert = self.assembler().derived_insert(
            TRANSACTION_TABLE,
            dialing_db,
            filters,
            campaign_id,
            max_records,
        )?;
        Ok(self.backend.execute(&insert).await?)
    }
}

/// The skill a caller's `client_id` filter names: its value, or the first operand.
fn skill_from_filter(filter: &Filter) -> Option<JsonValue> {
    match filter.operand() {
        Operand::Scalar(value) => Some(value.to_json()),
        Operand::List(values) => values.first().map(SqlValue::to_json),
        Operand::Pair(first, _) => Some(first.to_json()),
        Operand::Absent => None,
    }
}
