//! Transaction domain entity.
//! Framework-agnostic representation of one payment reported by the gateway.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Final state of a payment as reported in a postback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment status: {0:?}")]
pub struct UnknownPaymentStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    /// Case-sensitive: only the exact lowercase literals are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(PaymentStatus::Success),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(UnknownPaymentStatus(other.to_string())),
        }
    }
}

/// A validated transaction that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub gateway_transaction_id: String,
    pub session_identifier: String,
    pub payment_status: PaymentStatus,
    pub amount: BigDecimal,
    pub payment_date: NaiveDate,
    pub name_on_account: String,
}

/// A stored transaction. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub gateway_transaction_id: String,
    pub session_identifier: String,
    pub payment_status: PaymentStatus,
    pub amount: BigDecimal,
    pub payment_date: NaiveDate,
    pub name_on_account: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn from_draft(id: i64, draft: TransactionDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            gateway_transaction_id: draft.gateway_transaction_id,
            session_identifier: draft.session_identifier,
            payment_status: draft.payment_status,
            amount: draft.amount,
            payment_date: draft.payment_date,
            name_on_account: draft.name_on_account,
            created_at,
        }
    }
}
