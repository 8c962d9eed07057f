pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod startup;
pub mod utils;
pub mod validation;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::health::DependencyChecker;
use crate::services::TransactionProcessor;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub processor: TransactionProcessor,
    pub health_checkers: Arc<[Arc<dyn DependencyChecker>]>,
    pub start_time: Instant,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(handlers::openapi))
        .route("/upay/posting", post(handlers::posting::upay_posting))
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .with_state(state)
}

/// Any origin in dev and test; only the configured origins in prod.
pub fn cors_layer(config: &Config) -> CorsLayer {
    if config.environment.is_debug() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::memory_transaction_store::MemoryTransactionStore;
    use crate::config::Environment;
    use crate::health::tests::StaticChecker;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::services::PostingKey;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    pub(crate) fn test_state(
        store: Arc<MemoryTransactionStore>,
        posting_key: &str,
        database_healthy: bool,
    ) -> AppState {
        let checkers: Vec<Arc<dyn DependencyChecker>> = vec![Arc::new(StaticChecker {
            name: "postgres",
            healthy: database_healthy,
        })];

        AppState {
            app_name: "uPay API".to_string(),
            processor: TransactionProcessor::new(store, PostingKey::new(posting_key)),
            health_checkers: checkers.into(),
            start_time: Instant::now(),
        }
    }

    fn app(database_healthy: bool) -> Router {
        create_app(test_state(
            Arc::new(MemoryTransactionStore::new()),
            "k1",
            database_healthy,
        ))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_welcomes_with_app_name() {
        let response = app(true).oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(
            body_json(response).await["message"],
            "Welcome to the uPay API"
        );
    }

    #[tokio::test]
    async fn health_reports_dependencies() {
        let response = app(true).oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["dependencies"]["postgres"]["status"], "healthy");
    }

    #[tokio::test]
    async fn health_is_503_when_database_is_down() {
        let response = app(false).oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "unhealthy");
    }

    #[tokio::test]
    async fn openapi_document_lists_posting_route() {
        let response = app(true).oneshot(get_request("/openapi.json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["paths"]["/upay/posting"]["post"].is_object());
        assert_eq!(json["info"]["title"], "uPay API");
    }

    #[tokio::test]
    async fn inbound_request_id_is_echoed() {
        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "gateway-abc-123")
            .body(Body::empty())
            .unwrap();

        let response = app(true).oneshot(request).await.unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "gateway-abc-123");
    }

    #[test]
    fn prod_cors_is_built_from_configured_origins() {
        let config = Config::from_vars(|key| match key {
            "APP_ENV" => Some("prod".to_string()),
            "DATABASE_URL" => Some("postgres://localhost/upay".to_string()),
            "ALLOWED_ORIGINS" => {
                Some("https://pay.example.edu, https://admin.example.edu".to_string())
            }
            _ => None,
        })
        .unwrap();

        assert_eq!(config.environment, Environment::Prod);
        let _ = cors_layer(&config);
    }
}
