use clap::{Parser, Subcommand};
use sqlx::PgPool;
use std::path::Path;

use crate::adapters::PgTransactionStore;
use crate::config::Config;
use crate::db::queries::{self, SortField, SortOrder, TransactionFilter};
use crate::domain::{PaymentStatus, Transaction};
use crate::ports::TransactionStore;
use crate::utils::sanitize::mask_url_password;
use crate::validation::validate_date;

#[derive(Parser)]
#[command(name = "upay-core")]
#[command(about = "uPay Core - Payment Gateway Posting Receiver", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Transaction inspection commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Show the transaction recorded for a gateway transaction id
    Show {
        #[arg(value_name = "GATEWAY_ID")]
        gateway_id: String,
    },

    /// List recorded transactions
    List {
        /// success or cancelled
        #[arg(long)]
        status: Option<PaymentStatus>,

        /// Earliest payment date, mm/dd/yyyy
        #[arg(long)]
        from: Option<String>,

        /// Latest payment date, mm/dd/yyyy
        #[arg(long)]
        to: Option<String>,

        #[arg(long, value_enum, default_value_t = SortField::PaymentDate)]
        sort: SortField,

        #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
        order: SortOrder,

        #[arg(long, default_value_t = 50)]
        limit: i64,

        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool, Path::new(crate::db::MIGRATIONS_DIR)).await?;

    println!("✓ Database migrations completed");

    Ok(())
}

pub async fn handle_tx_show(pool: &PgPool, gateway_id: &str) -> anyhow::Result<()> {
    let store = PgTransactionStore::new(pool.clone());

    match store.find_by_gateway_id(gateway_id).await? {
        Some(tx) => {
            print_transaction(&tx);
            Ok(())
        }
        None => {
            tracing::warn!(gateway_transaction_id = %gateway_id, "Transaction not found");
            anyhow::bail!("Transaction {} not found", gateway_id)
        }
    }
}

pub struct ListArgs {
    pub status: Option<PaymentStatus>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl ListArgs {
    fn into_filter(self) -> anyhow::Result<TransactionFilter> {
        if self.limit <= 0 {
            anyhow::bail!("--limit must be greater than 0");
        }
        if self.offset < 0 {
            anyhow::bail!("--offset must not be negative");
        }

        let from = self.from.as_deref().map(parse_date_arg).transpose()?;
        let to = self.to.as_deref().map(parse_date_arg).transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                anyhow::bail!("--from must not be after --to");
            }
        }

        Ok(TransactionFilter {
            status: self.status,
            from,
            to,
            sort: self.sort,
            order: self.order,
            limit: Some(self.limit),
            offset: self.offset,
        })
    }
}

fn parse_date_arg(raw: &str) -> anyhow::Result<chrono::NaiveDate> {
    validate_date(raw).map_err(|e| anyhow::anyhow!("{}: {:?}", e, raw))
}

pub async fn handle_tx_list(pool: &PgPool, args: ListArgs) -> anyhow::Result<()> {
    let filter = args.into_filter()?;
    let page = queries::list_transactions(pool, &filter).await?;

    if page.items.is_empty() {
        println!("No transactions found");
        return Ok(());
    }

    println!(
        "{:<8} {:<24} {:<10} {:>10} {:<12} {:<24}",
        "ID", "Gateway ID", "Status", "Amount", "Date", "Name"
    );
    println!("{}", "-".repeat(92));

    for tx in &page.items {
        println!(
            "{:<8} {:<24} {:<10} {:>10} {:<12} {:<24}",
            tx.id,
            tx.gateway_transaction_id,
            tx.payment_status,
            tx.amount,
            tx.payment_date.format("%m/%d/%Y"),
            tx.name_on_account
        );
    }

    println!(
        "\nShowing {}-{} of {}{}",
        page.offset + 1,
        page.offset + page.items.len() as i64,
        page.total,
        if page.has_more { " (more available)" } else { "" }
    );

    Ok(())
}

fn print_transaction(tx: &Transaction) {
    println!("Transaction {}", tx.id);
    println!("  Gateway ID:   {}", tx.gateway_transaction_id);
    println!("  Session:      {}", tx.session_identifier);
    println!("  Status:       {}", tx.payment_status);
    println!("  Amount:       {}", tx.amount);
    println!("  Payment date: {}", tx.payment_date.format("%m/%d/%Y"));
    println!("  Name:         {}", tx.name_on_account);
    println!("  Recorded at:  {}", tx.created_at.to_rfc3339());
}

pub async fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  App Name:     {}", config.app_name);
    println!("  Environment:  {}", config.environment.as_str());
    println!("  Server Port:  {}", config.server_port);
    println!("  Database URL: {}", mask_url_password(&config.database_url));
    println!(
        "  Posting Key:  {}",
        if config.posting_key.is_empty() { "<unset>" } else { "****" }
    );

    let report = crate::startup::validate_environment(config).await;
    report.print();

    if !report.is_valid() {
        anyhow::bail!("Configuration is invalid");
    }

    tracing::info!("Configuration is valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("upay-core").chain(args.iter().copied())).unwrap()
    }

    fn list_args() -> ListArgs {
        ListArgs {
            status: None,
            from: None,
            to: None,
            sort: SortField::PaymentDate,
            order: SortOrder::Desc,
            limit: 50,
            offset: 0,
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        assert!(parse(&[]).command.is_none());
        assert!(matches!(parse(&["serve"]).command, Some(Commands::Serve)));
    }

    #[test]
    fn parses_tx_show() {
        match parse(&["tx", "show", "T1"]).command {
            Some(Commands::Tx(TxCommands::Show { gateway_id })) => assert_eq!(gateway_id, "T1"),
            _ => panic!("expected tx show"),
        }
    }

    #[test]
    fn parses_tx_list_options() {
        let cli = parse(&[
            "tx", "list", "--status", "cancelled", "--from", "01/01/2025", "--sort", "amount",
            "--order", "asc", "--limit", "10", "--offset", "20",
        ]);

        match cli.command {
            Some(Commands::Tx(TxCommands::List {
                status,
                from,
                to,
                sort,
                order,
                limit,
                offset,
            })) => {
                assert_eq!(status, Some(PaymentStatus::Cancelled));
                assert_eq!(from.as_deref(), Some("01/01/2025"));
                assert!(to.is_none());
                assert_eq!(sort, SortField::Amount);
                assert_eq!(order, SortOrder::Asc);
                assert_eq!(limit, 10);
                assert_eq!(offset, 20);
            }
            _ => panic!("expected tx list"),
        }
    }

    #[test]
    fn tx_list_defaults() {
        match parse(&["tx", "list"]).command {
            Some(Commands::Tx(TxCommands::List {
                sort, order, limit, offset, ..
            })) => {
                assert_eq!(sort, SortField::PaymentDate);
                assert_eq!(order, SortOrder::Desc);
                assert_eq!(limit, 50);
                assert_eq!(offset, 0);
            }
            _ => panic!("expected tx list"),
        }
    }

    #[test]
    fn rejects_unknown_status() {
        let result = Cli::try_parse_from(["upay-core", "tx", "list", "--status", "Success"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_db_migrate_and_config() {
        assert!(matches!(
            parse(&["db", "migrate"]).command,
            Some(Commands::Db(DbCommands::Migrate))
        ));
        assert!(matches!(parse(&["config"]).command, Some(Commands::Config)));
    }

    #[test]
    fn list_args_build_a_filter() {
        let filter = ListArgs {
            from: Some("01/01/2025".to_string()),
            to: Some("01/31/2025".to_string()),
            ..list_args()
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.from, chrono::NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(filter.to, chrono::NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(filter.limit, Some(50));
    }

    #[test]
    fn list_args_reject_bad_ranges() {
        let reversed = ListArgs {
            from: Some("02/01/2025".to_string()),
            to: Some("01/01/2025".to_string()),
            ..list_args()
        };
        assert!(reversed.into_filter().is_err());

        let bad_date = ListArgs {
            from: Some("2025-01-01".to_string()),
            ..list_args()
        };
        assert!(bad_date.into_filter().is_err());

        let zero_limit = ListArgs {
            limit: 0,
            ..list_args()
        };
        assert!(zero_limit.into_filter().is_err());
    }
}
