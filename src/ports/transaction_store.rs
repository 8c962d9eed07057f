//! Persistence port for transactions.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Transaction, TransactionDraft};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The unique constraint on the gateway transaction id rejected the row.
    #[error("transaction with gateway id {0} already exists")]
    DuplicateKey(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable transaction storage keyed by the gateway transaction id.
///
/// `insert` is the only arbiter of uniqueness: implementations must enforce
/// it atomically and report a collision as [`StoreError::DuplicateKey`]
/// instead of checking beforehand.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, draft: &TransactionDraft) -> StoreResult<Transaction>;

    async fn find_by_gateway_id(
        &self,
        gateway_transaction_id: &str,
    ) -> StoreResult<Option<Transaction>>;
}
