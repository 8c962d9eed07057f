use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use upay_core::adapters::PgTransactionStore;
use upay_core::cli::{self, Cli, Commands, DbCommands, ListArgs, TxCommands};
use upay_core::config::Config;
use upay_core::health::{DependencyChecker, PostgresChecker};
use upay_core::services::{PostingKey, TransactionProcessor};
use upay_core::{create_app, cors_layer, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(&config);

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Tx(TxCommands::Show { gateway_id }) => {
            let pool = db::create_pool(&config).await?;
            cli::handle_tx_show(&pool, &gateway_id).await
        }
        Commands::Tx(TxCommands::List {
            status,
            from,
            to,
            sort,
            order,
            limit,
            offset,
        }) => {
            let pool = db::create_pool(&config).await?;
            let args = ListArgs {
                status,
                from,
                to,
                sort,
                order,
                limit,
                offset,
            };
            cli::handle_tx_list(&pool, args).await
        }
        Commands::Config => cli::handle_config_validate(&config).await,
    }
}

fn init_tracing(config: &Config) {
    let default_level = if config.environment.is_debug() { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_level.into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.environment.is_debug() {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(config = ?config, "Starting {}", config.app_name);

    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool, Path::new(db::MIGRATIONS_DIR)).await?;

    let posting_key = PostingKey::new(&config.posting_key);
    if !posting_key.is_configured() {
        tracing::warn!("POSTING_KEY is not set; every posting will be rejected with 401");
    }

    let store = Arc::new(PgTransactionStore::new(pool.clone()));
    let processor = TransactionProcessor::new(store, posting_key);

    let health_checkers: Vec<Arc<dyn DependencyChecker>> =
        vec![Arc::new(PostgresChecker::new(pool.clone()))];

    let app_state = AppState {
        app_name: config.app_name.clone(),
        processor,
        health_checkers: health_checkers.into(),
        start_time: Instant::now(),
    };

    let app = create_app(app_state).layer(cors_layer(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
