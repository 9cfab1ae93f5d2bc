//! Inputs of the exposed operations, as they arrive from the transport layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// `select(table, filters?, columns?, limit, offset, order_by?)`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectRequest {
    pub table: String,
    #[serde(default)]
    pub filters: Option<JsonValue>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountRequest {
    pub table: String,
    #[serde(default)]
    pub filters: Option<JsonValue>,
}

/// Contacts LEFT JOIN contact details, one row per contact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinedSelectRequest {
    #[serde(default)]
    pub contact_filters: Option<JsonValue>,
    #[serde(default)]
    pub details_filters: Option<JsonValue>,
    #[serde(default)]
    pub contact_columns: Option<Vec<String>>,
    #[serde(default)]
    pub details_columns: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub order_by: Option<String>,
}

/// Tables whose physical location depends on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutedTable {
    Contact,
    /// Live table plus monthly archives.
    Transaction,
}

impl RoutedTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutedTable::Contact => "contact",
            RoutedTable::Transaction => "transaction",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutedSelectRequest {
    pub client_id: i64,
    pub table: RoutedTable,
    #[serde(default)]
    pub filters: Option<JsonValue>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub order_by: Option<String>,
}

/// Campaigns in the Oracle configuration database.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignSelectRequest {
    #[serde(default)]
    pub filters: Option<JsonValue>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub client_id: i64,
    #[serde(default)]
    pub data: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignFromQueryRequest {
    /// The real client id. Transaction filters on `client_id` address skills.
    pub client_id: i64,
    pub query_filters: Map<String, JsonValue>,
    #[serde(default)]
    pub campaign_data: Option<Map<String, JsonValue>>,
    #[serde(default)]
    pub max_records: Option<i64>,
}
