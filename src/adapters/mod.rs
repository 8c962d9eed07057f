pub mod postgres_transaction_store;

#[cfg(test)]
pub mod memory_transaction_store;

pub use postgres_transaction_store::PgTransactionStore;
