use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder, Result};

use crate::db::models::{TransactionRow, TRANSACTION_COLUMNS};
use crate::domain::{PaymentStatus, Transaction};

// --- Transaction listing (operator tooling) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortField {
    #[default]
    PaymentDate,
    CreatedAt,
    Amount,
}

impl SortField {
    fn column(&self) -> &'static str {
        match self {
            SortField::PaymentDate => "payment_date",
            SortField::CreatedAt => "created_at",
            SortField::Amount => "amount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub status: Option<PaymentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sort: SortField,
    pub order: SortOrder,
    pub limit: Option<i64>,
    pub offset: i64,
}

#[derive(Debug)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub total: i64,
    pub offset: i64,
    pub limit: Option<i64>,
    pub has_more: bool,
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &TransactionFilter) {
    let mut separator = " WHERE ";

    if let Some(status) = filter.status {
        builder.push(separator).push("payment_status = ").push_bind(status.as_str());
        separator = " AND ";
    }
    if let Some(from) = filter.from {
        builder.push(separator).push("payment_date >= ").push_bind(from);
        separator = " AND ";
    }
    if let Some(to) = filter.to {
        builder.push(separator).push("payment_date <= ").push_bind(to);
    }
}

fn count_query(filter: &TransactionFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM transactions");
    push_filters(&mut builder, filter);
    builder
}

fn list_query(filter: &TransactionFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder =
        QueryBuilder::new(format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS));
    push_filters(&mut builder, filter);

    // id breaks ties so pages are stable
    builder.push(format!(
        " ORDER BY {} {}, id {}",
        filter.sort.column(),
        filter.order.keyword(),
        filter.order.keyword()
    ));

    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }
    builder.push(" OFFSET ").push_bind(filter.offset);
    builder
}

pub async fn list_transactions(
    pool: &PgPool,
    filter: &TransactionFilter,
) -> Result<TransactionPage> {
    let total = count_query(filter)
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    let rows = list_query(filter)
        .build_query_as::<TransactionRow>()
        .fetch_all(pool)
        .await?;

    let items = rows
        .into_iter()
        .map(Transaction::try_from)
        .collect::<Result<Vec<_>>>()?;

    let has_more = filter.limit.is_some() && total > filter.offset + items.len() as i64;

    Ok(TransactionPage {
        items,
        total,
        offset: filter.offset,
        limit: filter.limit,
        has_more,
    })
}
