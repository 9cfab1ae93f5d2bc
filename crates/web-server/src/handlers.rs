use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, State},
};
use gateway::{
    CampaignCreated, CampaignFromQueryRequest, CampaignOutcome, CampaignSelectRequest,
    ContactWithDetails, CountRequest, CreateCampaignRequest, JoinedSelectRequest,
    RoutedSelectRequest, SelectRequest,
};
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;

type Rows = Vec<Map<String, JsonValue>>;

/// # POST /api/records/select
pub async fn select_records(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<Rows>, AppError> {
    Ok(Json(state.gateway.select(&request).await?))
}

/// # POST /api/records/count
pub async fn count_records(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CountRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let count = state.gateway.count(&request).await?;
    Ok(Json(json!({ "count": count })))
}

/// # POST /api/contacts/with-details
pub async fn select_contacts_with_details(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinedSelectRequest>,
) -> Result<Json<Rows>, AppError> {
    Ok(Json(state.gateway.select_joined(&request).await?))
}

/// # GET /api/contacts/:lvaccount_id
pub async fn get_contact_with_details(
    Path(lvaccount_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ContactWithDetails>, AppError> {
    Ok(Json(state.gateway.get_contact_with_details(&lvaccount_id).await?))
}

/// # POST /api/routed/select
/// Contacts or transactions, wherever the client's data lives.
pub async fn select_routed(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RoutedSelectRequest>,
) -> Result<Json<Rows>, AppError> {
    Ok(Json(state.gateway.select_routed(&request).await?))
}

/// # GET /api/clients/:client_id/transaction-tables
pub async fn transaction_tables(
    Path(client_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.gateway.resolve_tables(client_id).await?))
}

/// # POST /api/campaigns/select
pub async fn select_campaigns(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CampaignSelectRequest>,
) -> Result<Json<Rows>, AppError> {
    Ok(Json(state.gateway.select_campaigns(&request).await?))
}

/// # POST /api/campaigns
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<Json<CampaignCreated>, AppError> {
    Ok(Json(state.gateway.create_campaign(&request).await?))
}

/// # POST /api/campaigns/from-query
/// A query matching nothing is a normal `success: false` outcome, not an error.
pub async fn create_campaign_from_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CampaignFromQueryRequest>,
) -> Result<Json<CampaignOutcome>, AppError> {
    Ok(Json(state.gateway.create_campaign_from_query(&request).await?))
}
