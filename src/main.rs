use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cashcard_api::app::{app, AppState};
use cashcard_api::auth::{IdentityProvider, InMemoryIdentityProvider};
use cashcard_api::config::{self, AppConfig};
use cashcard_api::database::fixtures::demo_cards;
use cashcard_api::database::{CardStore, DatabaseManager, InMemoryCardStore, PgCardStore};

#[derive(Parser)]
#[command(name = "cashcard-api")]
#[command(about = "Owner-scoped cash card REST API")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides CASHCARD_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Use the in-memory store even when DATABASE_URL is set")]
    memory: bool,

    #[arg(long, help = "Seed the demo cards on startup")]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_USERS, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let args = Args::parse();
    let config = config::config();
    info!("Starting CashCard API in {:?} mode", config.environment);

    if cashcard_api::is_production!() && config.security.users.is_empty() {
        warn!("No users configured; set SECURITY_USERS or every card request will be rejected");
    }

    let seed = args.seed_demo || config.database.seed_demo_data;
    let store = build_store(config, args.memory, seed).await?;
    let identities: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentityProvider::new(&config.security.users));
    let state = AppState::new(config, store, identities).context("invalid pagination config")?;

    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", config.server.host, port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("CashCard API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn build_store(config: &AppConfig, force_memory: bool, seed: bool) -> anyhow::Result<Arc<dyn CardStore>> {
    if config.database.url.is_some() && !force_memory {
        let pool = DatabaseManager::connect(&config.database).await?;
        let store = PgCardStore::new(pool, &config.database);
        store.ensure_schema().await?;
        if seed {
            store.seed(&demo_cards()).await?;
        }
        return Ok(Arc::new(store));
    }

    info!("Using in-memory card store");
    let store = InMemoryCardStore::new();
    if seed {
        store.seed(demo_cards()).await;
        info!("Seeded {} demo cards", store.len().await);
    }
    Ok(Arc::new(store))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
