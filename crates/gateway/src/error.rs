use core_types::DatabaseType;
use database::DbError;
use guardrails::GuardrailError;
use query_builder::QueryError;
use thiserror::Error;

/// A request could not be routed to a database.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("No client found for client_id {0}")]
    ClientNotFound(i64),

    #[error("No active skills found for client_id {0}")]
    NoSkills(i64),

    #[error("{operation} currently only supports Oracle databases, client is on {backend}")]
    UnsupportedBackend {
        operation: &'static str,
        backend: DatabaseType,
    },
}

#[derive(Error, Debug)]
pub enum GatewayError {
    /// Bad table, column, operator or operand shape. Never reached a backend.
    #[error("Invalid request: {0}")]
    Validation(QueryError),

    #[error("Guardrail violation: {0}")]
    Guardrail(#[from] GuardrailError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Database error: {0}")]
    Backend(#[from] DbError),

    /// The campaign row exists but its transactions were not copied.
    #[error("Campaign {campaign_id} was created but its records were not inserted: {source}")]
    OrphanedCampaign {
        campaign_id: i64,
        source: Box<GatewayError>,
    },
}

impl From<QueryError> for GatewayError {
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::Guardrail(guardrail) => GatewayError::Guardrail(guardrail),
            other => GatewayError::Validation(other),
        }
    }
}

impl GatewayError {
    /// The orphaned campaign id, when a campaign was left without records.
    pub fn campaign_id(&self) -> Option<i64> {
        match self {
            GatewayError::OrphanedCampaign { campaign_id, .. } => Some(*campaign_id),
            _ => None,
        }
    }
}
