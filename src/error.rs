use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::middleware::RequestId;
use crate::services::PostingError;
use crate::validation::ValidationError;

pub const INTERNAL_ERROR_DETAIL: &str = "An internal server error occurred";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid posting key")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request body could not be decoded into the expected form.
    #[error("Validation error: {0}")]
    UnprocessableForm(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UnprocessableForm(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "invalid_posting_key",
            AppError::Validation(e) => e.code(),
            AppError::UnprocessableForm(_) => "validation_error",
            AppError::Internal(_) => "internal_server_error",
        }
    }

    /// Message safe to show to the caller. Internal details never leave the
    /// server.
    fn public_detail(&self) -> String {
        match self {
            AppError::Internal(_) => INTERNAL_ERROR_DETAIL.to_string(),
            other => other.to_string(),
        }
    }

    pub fn with_request_id(self, request_id: RequestId) -> ApiError {
        ApiError {
            error: self,
            request_id,
        }
    }
}

impl From<PostingError> for AppError {
    fn from(err: PostingError) -> Self {
        match err {
            PostingError::Unauthorized => AppError::Unauthorized,
            PostingError::Rejected(e) => AppError::Validation(e),
            PostingError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
    pub code: String,
    pub field: Option<String>,
    pub request_id: String,
    pub status_code: u16,
}

/// An [`AppError`] tied to the request it happened in.
#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub request_id: RequestId,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let field = match &self.error {
            AppError::Validation(e) => Some(e.field().to_string()),
            _ => None,
        };

        let body = Json(ErrorBody {
            detail: self.error.public_detail(),
            code: self.error.code().to_string(),
            field,
            request_id: self.request_id.to_string(),
            status_code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.with_request_id(RequestId::new()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Validation(ValidationError::InvalidAmount).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UnprocessableForm("missing field".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_posting_error_mapping() {
        assert!(matches!(
            AppError::from(PostingError::Unauthorized),
            AppError::Unauthorized
        ));
        assert!(matches!(
            AppError::from(PostingError::Rejected(ValidationError::InvalidStatus)),
            AppError::Validation(ValidationError::InvalidStatus)
        ));
        assert!(matches!(
            AppError::from(PostingError::Storage(StoreError::Database(sqlx::Error::PoolTimedOut))),
            AppError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_response() {
        let request_id = RequestId::new();
        let response = AppError::Unauthorized
            .with_request_id(request_id.clone())
            .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Invalid posting key");
        assert_eq!(body["request_id"], request_id.as_str());
        assert_eq!(body["status_code"], 401);
    }

    #[tokio::test]
    async fn test_validation_response_names_field() {
        let response = AppError::Validation(ValidationError::InvalidDate).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "invalid_date");
        assert_eq!(body["field"], "pmt_date");
        assert_eq!(body["detail"], "Invalid payment date. Format must be mm/dd/yyyy");
    }

    #[tokio::test]
    async fn test_internal_response_hides_details() {
        let response =
            AppError::Internal("connection refused on 10.0.0.5".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["detail"], INTERNAL_ERROR_DETAIL);
        assert!(!body.to_string().contains("10.0.0.5"));
    }
}
