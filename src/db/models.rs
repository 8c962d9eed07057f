use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::domain::{PaymentStatus, Transaction};

/// Row shape of the `transactions` table.
#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub gateway_transaction_id: String,
    pub session_identifier: String,
    pub payment_status: String,
    pub amount: BigDecimal,
    pub payment_date: NaiveDate,
    pub name_on_account: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = sqlx::Error;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let payment_status = row
            .payment_status
            .parse::<PaymentStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Transaction {
            id: row.id,
            gateway_transaction_id: row.gateway_transaction_id,
            session_identifier: row.session_identifier,
            payment_status,
            amount: row.amount,
            payment_date: row.payment_date,
            name_on_account: row.name_on_account,
            created_at: row.created_at,
        })
    }
}

pub const TRANSACTION_COLUMNS: &str = "id, gateway_transaction_id, session_identifier, \
     payment_status, amount, payment_date, name_on_account, created_at";
