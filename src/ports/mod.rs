//! Boundaries between the posting pipeline and its collaborators.

pub mod transaction_store;

pub use transaction_store::{StoreError, StoreResult, TransactionStore};
