use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use gateway::ContactGateway;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub gateway: ContactGateway,
}

/// Every route, wired to `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/records/select", post(handlers::select_records))
        .route("/api/records/count", post(handlers::count_records))
        .route("/api/contacts/with-details", post(handlers::select_contacts_with_details))
        .route("/api/contacts/:lvaccount_id", get(handlers::get_contact_with_details))
        .route("/api/routed/select", post(handlers::select_routed))
        .route(
            "/api/clients/:client_id/transaction-tables",
            get(handlers::transaction_tables),
        )
        .route("/api/campaigns/select", post(handlers::select_campaigns))
        .route("/api/campaigns", post(handlers::create_campaign))
        .route("/api/campaigns/from-query", post(handlers::create_campaign_from_query))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}

/// Serves the gateway over HTTP until the process is stopped.
pub async fn run_server(gateway: ContactGateway, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(Arc::new(AppState { gateway }));

    tracing::info!("Web server started and listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use gateway::GatewayOptions;
    use guardrails::SchemaRegistry;
    use serde_json::{Value as JsonValue, json};
    use tower::ServiceExt;

    /// No backends: anything that gets as far as execution fails as not configured.
    fn app() -> Router {
        let gateway = ContactGateway::new(SchemaRegistry::builtin(), GatewayOptions::default());
        router(Arc::new(AppState { gateway }))
    }

    async fn post(uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_check() {
        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests() {
        let (status, body) = post(
            "/api/records/select",
            json!({"table": "contact", "filters": {"state": ["between", [1]]}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("state"));
    }

    #[tokio::test]
    async fn guardrail_errors_are_unprocessable() {
        let (status, body) = post("/api/records/count", json!({"table": "users"})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("users"));
    }

    #[tokio::test]
    async fn backend_errors_hide_details() {
        let (status, body) = post("/api/records/select", json!({"table": "contact"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("An internal database error occurred"));
    }
}
