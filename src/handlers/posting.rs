use axum::{
    extract::{rejection::FormRejection, State},
    http::HeaderMap,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, AppError};
use crate::middleware::RequestId;
use crate::services::{PostingError, PostingRequest};
use crate::AppState;

/// Form fields sent by the payment gateway. All are required strings; a
/// missing one is a decode failure (422), an empty one is rejected by
/// field validation (400).
#[derive(Debug, Deserialize, ToSchema)]
pub struct PostingForm {
    /// Shared secret proving the postback comes from the gateway.
    pub posting_key: String,
    /// Transaction reference number assigned by the payment gateway.
    pub tpg_trans_id: String,
    pub session_identifier: String,
    /// `success` or `cancelled`.
    pub pmt_status: String,
    /// Amount, at most 99999.99.
    pub pmt_amt: String,
    /// Payment date as mm/dd/yyyy.
    pub pmt_date: String,
    pub name_on_acct: String,
}

impl From<PostingForm> for PostingRequest {
    fn from(form: PostingForm) -> Self {
        PostingRequest {
            posting_key: Some(form.posting_key),
            tpg_trans_id: Some(form.tpg_trans_id),
            session_identifier: Some(form.session_identifier),
            pmt_status: Some(form.pmt_status),
            pmt_amt: Some(form.pmt_amt),
            pmt_date: Some(form.pmt_date),
            name_on_acct: Some(form.name_on_acct),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostingResponse {
    pub success: bool,
    pub message: String,
    pub transaction_id: i64,
}

#[utoipa::path(
    post,
    path = "/upay/posting",
    request_body(content = PostingForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (
            status = 200,
            description = "Transaction recorded or already recorded",
            body = PostingResponse
        ),
        (
            status = 400,
            description = "A field is empty or invalid",
            body = crate::error::ErrorBody
        ),
        (status = 401, description = "Invalid posting key", body = crate::error::ErrorBody),
        (status = 422, description = "Undecodable form", body = crate::error::ErrorBody),
        (status = 500, description = "Storage failure", body = crate::error::ErrorBody)
    ),
    tag = "upay"
)]
pub async fn upay_posting(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<PostingForm>, FormRejection>,
) -> Result<Json<PostingResponse>, ApiError> {
    let request_id = RequestId::from_headers(&headers);

    let Form(form) = form.map_err(|rejection| {
        tracing::info!(error = %rejection.body_text(), "Rejected undecodable posting form");
        AppError::UnprocessableForm(rejection.body_text()).with_request_id(request_id.clone())
    })?;

    let request = PostingRequest::from(form);

    match state.processor.process(&request).await {
        Ok(outcome) => Ok(Json(PostingResponse {
            success: true,
            message: outcome.message().to_string(),
            transaction_id: outcome.transaction_id(),
        })),
        Err(err) => {
            if let PostingError::Storage(source) = &err {
                tracing::error!(
                    request_id = %request_id,
                    error = %source,
                    "Posting failed with a storage error"
                );
            }
            Err(AppError::from(err).with_request_id(request_id))
        }
    }
}
