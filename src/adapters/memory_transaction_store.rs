//! In-memory TransactionStore used by unit and router tests.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::{Transaction, TransactionDraft};
use crate::ports::{StoreError, StoreResult, TransactionStore};

#[derive(Default)]
pub struct MemoryTransactionStore {
    rows: Mutex<Vec<Transaction>>,
    /// Makes lookups miss, the way a concurrent writer that has not
    /// committed yet looks to a reader.
    hide_rows_from_lookup: AtomicBool,
    fail_with_database_error: AtomicBool,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hide_rows_from_first_lookup(&self) {
        self.hide_rows_from_lookup.store(true, Ordering::SeqCst);
    }

    pub fn fail_all_calls(&self) {
        self.fail_with_database_error.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check_failure(&self) -> StoreResult<()> {
        if self.fail_with_database_error.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn insert(&self, draft: &TransactionDraft) -> StoreResult<Transaction> {
        self.check_failure()?;
        let mut rows = self.rows.lock().unwrap();

        if rows
            .iter()
            .any(|row| row.gateway_transaction_id == draft.gateway_transaction_id)
        {
            return Err(StoreError::DuplicateKey(draft.gateway_transaction_id.clone()));
        }

        let id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;
        let tx = Transaction::from_draft(id, draft.clone(), Utc::now());
        rows.push(tx.clone());
        Ok(tx)
    }

    async fn find_by_gateway_id(
        &self,
        gateway_transaction_id: &str,
    ) -> StoreResult<Option<Transaction>> {
        self.check_failure()?;

        if self.hide_rows_from_lookup.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }

        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|row| row.gateway_transaction_id == gateway_transaction_id)
            .cloned())
    }
}
