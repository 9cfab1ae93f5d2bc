use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gateway::{GatewayError, RoutingError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::error::ConfigError),
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Every failure body is `{"success": false, "error": ...}`. An orphaned
/// campaign also carries its `campaign_id`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, campaign_id) = match self {
            AppError::Gateway(GatewayError::Validation(e)) => (StatusCode::BAD_REQUEST, e.to_string(), None),
            AppError::Gateway(GatewayError::Guardrail(e)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string(), None)
            }
            AppError::Gateway(GatewayError::Routing(e)) => {
                let status = match e {
                    RoutingError::ClientNotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, e.to_string(), None)
            }
            AppError::Gateway(GatewayError::Backend(db_err)) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                    None,
                )
            }
            AppError::Gateway(orphan @ GatewayError::OrphanedCampaign { .. }) => {
                tracing::error!(error = %orphan, "Orphaned campaign.");
                let campaign_id = orphan.campaign_id();
                (StatusCode::INTERNAL_SERVER_ERROR, orphan.to_string(), campaign_id)
            }
            AppError::Config(config_err) => {
                tracing::error!(error = ?config_err, "Configuration error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A server configuration error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({ "success": false, "error": error_message });
        if let Some(campaign_id) = campaign_id {
            body["campaign_id"] = json!(campaign_id);
        }
        (status, Json(body)).into_response()
    }
}
