use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::ports::{StoreError, TransactionStore};
use crate::services::PostingKey;
use crate::validation::{validate_fields, RawFields, ValidationError};

/// One gateway postback as received. Absent fields are `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostingRequest {
    pub posting_key: Option<String>,
    pub tpg_trans_id: Option<String>,
    pub session_identifier: Option<String>,
    pub pmt_status: Option<String>,
    pub pmt_amt: Option<String>,
    pub pmt_date: Option<String>,
    pub name_on_acct: Option<String>,
}

impl PostingRequest {
    fn fields(&self) -> RawFields<'_> {
        RawFields {
            gateway_transaction_id: self.tpg_trans_id.as_deref(),
            session_identifier: self.session_identifier.as_deref(),
            payment_status: self.pmt_status.as_deref(),
            amount: self.pmt_amt.as_deref(),
            payment_date: self.pmt_date.as_deref(),
            name_on_account: self.name_on_acct.as_deref(),
        }
    }
}

/// Successful result of a posting. Both variants are success from the
/// gateway's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingOutcome {
    Created(i64),
    AlreadyProcessed(i64),
}

impl PostingOutcome {
    pub fn transaction_id(&self) -> i64 {
        match self {
            PostingOutcome::Created(id) | PostingOutcome::AlreadyProcessed(id) => *id,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PostingOutcome::Created(_) => "Transaction processed successfully",
            PostingOutcome::AlreadyProcessed(_) => "Transaction already processed",
        }
    }
}

#[derive(Debug, Error)]
pub enum PostingError {
    #[error("Invalid posting key")]
    Unauthorized,

    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

/// Authenticates, validates and records gateway postings exactly once per
/// gateway transaction id. Holds no per-request state.
#[derive(Clone)]
pub struct TransactionProcessor {
    store: Arc<dyn TransactionStore>,
    posting_key: PostingKey,
}

impl TransactionProcessor {
    pub fn new(store: Arc<dyn TransactionStore>, posting_key: PostingKey) -> Self {
        Self { store, posting_key }
    }

    /// Checks run in a fixed order and each one short-circuits the rest:
    /// posting key, required fields, status, amount, date, existing row,
    /// insert.
    #[tracing::instrument(skip_all, fields(gateway_transaction_id = tracing::field::Empty))]
    pub async fn process(&self, request: &PostingRequest) -> Result<PostingOutcome, PostingError> {
        let posting_key = request.posting_key.as_deref().unwrap_or_default();
        if !self.posting_key.verify(posting_key) {
            warn!("Rejected posting with an invalid posting key");
            return Err(PostingError::Unauthorized);
        }

        let draft = validate_fields(&request.fields()).map_err(|e| {
            info!(field = e.field(), code = e.code(), "Rejected posting: {}", e);
            PostingError::Rejected(e)
        })?;

        tracing::Span::current().record(
            "gateway_transaction_id",
            draft.gateway_transaction_id.as_str(),
        );

        if let Some(existing) = self
            .store
            .find_by_gateway_id(&draft.gateway_transaction_id)
            .await
            .map_err(PostingError::Storage)?
        {
            info!(transaction_id = existing.id, "Transaction already processed");
            return Ok(PostingOutcome::AlreadyProcessed(existing.id));
        }

        match self.store.insert(&draft).await {
            Ok(tx) => {
                info!(
                    transaction_id = tx.id,
                    payment_status = %tx.payment_status,
                    amount = %tx.amount,
                    "Transaction recorded"
                );
                Ok(PostingOutcome::Created(tx.id))
            }
            // Another worker inserted the same gateway id between our lookup
            // and our insert.
            Err(StoreError::DuplicateKey(gateway_transaction_id)) => {
                self.resolve_duplicate(&gateway_transaction_id).await
            }
            Err(e) => Err(PostingError::Storage(e)),
        }
    }

    async fn resolve_duplicate(
        &self,
        gateway_transaction_id: &str,
    ) -> Result<PostingOutcome, PostingError> {
        match self
            .store
            .find_by_gateway_id(gateway_transaction_id)
            .await
            .map_err(PostingError::Storage)?
        {
            Some(existing) => {
                info!(
                    transaction_id = existing.id,
                    "Concurrent duplicate posting resolved to existing transaction"
                );
                Ok(PostingOutcome::AlreadyProcessed(existing.id))
            }
            None => Err(PostingError::Storage(StoreError::DuplicateKey(
                gateway_transaction_id.to_string(),
            ))),
        }
    }
}
