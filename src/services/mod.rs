pub mod posting_key;
pub mod transaction_processor;

pub use posting_key::PostingKey;
pub use transaction_processor::{PostingError, PostingOutcome, PostingRequest, TransactionProcessor};
