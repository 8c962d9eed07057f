pub mod posting;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::error::ErrorBody;
use crate::health;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct WelcomeMessage {
    pub message: String,
}

pub async fn root(State(state): State<AppState>) -> Json<WelcomeMessage> {
    Json(WelcomeMessage {
        message: format!("Welcome to the {}", state.app_name),
    })
}

/// Liveness and readiness. Returns 503 when a critical dependency is down.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = health::check_health(&state.health_checkers, state.start_time).await;

    let status_code = if response.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "uPay API",
        description = "API for processing uPay Posting URL parameters"
    ),
    paths(posting::upay_posting),
    components(schemas(posting::PostingForm, posting::PostingResponse, ErrorBody)),
    tags((name = "upay", description = "Payment gateway postbacks"))
)]
pub struct ApiDoc;

pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
