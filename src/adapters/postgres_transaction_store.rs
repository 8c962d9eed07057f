//! Postgres implementation of TransactionStore.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::models::{TransactionRow, TRANSACTION_COLUMNS};
use crate::domain::{Transaction, TransactionDraft};
use crate::ports::{StoreError, StoreResult, TransactionStore};

/// Postgres-backed transaction store. Uniqueness of the gateway id is
/// enforced by the `transactions_gateway_transaction_id_key` constraint.
#[derive(Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn insert(&self, draft: &TransactionDraft) -> StoreResult<Transaction> {
        let sql = format!(
            r#"
            INSERT INTO transactions (
                gateway_transaction_id, session_identifier, payment_status,
                amount, payment_date, name_on_account
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );

        let result = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(&draft.gateway_transaction_id)
            .bind(&draft.session_identifier)
            .bind(draft.payment_status.as_str())
            .bind(&draft.amount)
            .bind(draft.payment_date)
            .bind(&draft.name_on_account)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(Transaction::try_from(row)?),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::DuplicateKey(draft.gateway_transaction_id.clone()))
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    async fn find_by_gateway_id(
        &self,
        gateway_transaction_id: &str,
    ) -> StoreResult<Option<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE gateway_transaction_id = $1",
            TRANSACTION_COLUMNS
        );

        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(gateway_transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Transaction::try_from).transpose()?)
    }
}
