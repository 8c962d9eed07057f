pub mod transaction;

pub use transaction::{PaymentStatus, Transaction, TransactionDraft};
