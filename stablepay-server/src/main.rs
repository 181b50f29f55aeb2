//! Stablepay Server
//!
//! Checkout backend for accepting stablecoin payments from any supported chain.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use stablepay_core::entities::{MemoryPaymentLinkStore, PaymentLinkStore, PgPaymentLinkStore};
use state::AppState;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Stablepay - multi-chain stablecoin checkout
#[derive(Parser, Debug)]
#[command(name = "stablepay-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./stablepay-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "STABLEPAY_LOG_JSON", default_value = "false")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.log_json);

    tracing::info!("Starting stablepay-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let runtime_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = runtime_config.server.listen;
    tracing::info!(
        chains = runtime_config.checkout.supported_chains.len(),
        rpc_endpoints = runtime_config.rpc.len(),
        "Configuration loaded from {:?}",
        args.config
    );

    // Short links live in Postgres when DATABASE_URL is set, in memory otherwise
    let db_pool = match get_database_url() {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&database_url)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to database: {}", e);
                    e
                })?;
            tracing::info!("Database connection established");

            if args.migrate {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("../migrations").run(&pool).await.map_err(|e| {
                    tracing::error!("Failed to run migrations: {}", e);
                    e
                })?;
                tracing::info!("Migrations completed successfully");
            }
            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, payment links are kept in memory");
            None
        }
    };

    let links: Arc<dyn PaymentLinkStore> = match &db_pool {
        Some(pool) => Arc::new(PgPaymentLinkStore::new(pool.clone())),
        None => Arc::new(MemoryPaymentLinkStore::new()),
    };

    let state = AppState::new(runtime_config, links);

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader)?;

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler to stop
    shutdown_notify.notify_one();

    if let Some(pool) = db_pool {
        tracing::info!("Closing database connections...");
        pool.close().await;
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
