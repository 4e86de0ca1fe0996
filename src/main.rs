//! # Strangle Watch — Position Monitor
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  every 5 min / on demand   ┌───────────────────────────┐
//!  │ Monitor task │ ─────────────────────────▶ │ Quote Source (REST)       │
//!  │  (1 actor)   │ ◀───────── last / open ─── └───────────────────────────┘
//!  │              │
//!  │  evaluate →  │ ── first breach only ────▶ Telegram
//!  │  alert FSM   │
//!  │              │ ── alert_sent ───────────▶ Position Store (memory/file/pg)
//!  └──────┬───────┘
//!         │ CycleReport + WsEvents
//!         ▼
//!  ┌──────────────┐   GET  /api/monitor/snapshot   ┌─────────────┐
//!  │  AppState    │ ◀───────────────────────────── │  Dashboard  │
//!  │  (Axum)      │   POST /api/positions          │             │
//!  └──────────────┘   ws://host/ws/monitor  ─────▶ └─────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! See [`config`].  `RUST_LOG` tunes the tracing filter.

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::Context;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod engine;
mod error;
mod events;
mod market;
mod models;
mod notify;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;

use config::{Config, StoreBackend};
use engine::{monitor::Monitor, runner::spawn_monitor};
use market::{MarketDataClient, QuoteCache, QuoteSource};
use notify::{LogNotifier, Notifier, TelegramNotifier};
use state::AppState;
use store::{FileStore, MemoryStore, PositionStore};

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional — prod can use real env vars) ─────────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("strangle_watch=debug".parse()?)
            .add_directive("tower_http=info".parse()?))
        .init();

    info!(
        r#"

  ╔═══════════════════════════════════════════════╗
  ║        STRANGLE WATCH — Position Monitor      ║
  ║        Quotes · Breach · Alert · Re-arm       ║
  ╚═══════════════════════════════════════════════╝"#
    );

    let config = Config::from_env().context("Failed to load config")?;

    // ── 3. Collaborators ─────────────────────────────────────────────────────
    // The store must work before anything else starts.
    let store = open_store(&config.store).await?;
    let http_client = reqwest::Client::new();

    let quotes: Arc<dyn QuoteSource> = Arc::new(MarketDataClient::new(
        http_client.clone(),
        &config.quote_api_url,
        &config.market_data_token,
        config.http_timeout,
    ));

    let notifier: Arc<dyn Notifier> = match &config.telegram {
        Some(tg) => Arc::new(TelegramNotifier::new(
            http_client.clone(),
            &tg.api_url,
            &tg.bot_token,
            &tg.chat_id,
            config.http_timeout,
        )),
        None => {
            warn!("TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set — alerts will only be logged");
            Arc::new(LogNotifier)
        }
    };

    info!(
        store    = %config.store,
        interval = ?config.refresh_interval,
        timeout  = ?config.http_timeout,
        "Collaborators ready"
    );

    // ── 4. Shared state + monitor task ───────────────────────────────────────
    let monitor = Monitor::new(
        store.clone(),
        QuoteCache::new(quotes, config.refresh_interval),
        notifier,
    );
    let state = Arc::new(AppState::new(store, monitor, config.refresh_interval));
    let monitor_task = spawn_monitor(state.clone());

    // ── 5. Router ────────────────────────────────────────────────────────────
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // ── 6. Bind & Serve ──────────────────────────────────────────────────────
    info!(addr = ?config.bind_addr, "🚀 Strangle Watch starting");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    // Without the monitor nothing is watched; exit so a supervisor restarts us.
    tokio::select! {
        served = axum::serve(listener, app).into_future() => served?,
        stopped = monitor_task => {
            anyhow::bail!("Monitor task stopped unexpectedly: {stopped:?}");
        }
    }

    Ok(())
}

/// Opens the configured backend.  Failure here is fatal.
async fn open_store(backend: &StoreBackend) -> anyhow::Result<Arc<dyn PositionStore>> {
    let store: Arc<dyn PositionStore> = match backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File(path) => Arc::new(
            FileStore::open(path)
                .await
                .context("Failed to open positions file")?,
        ),
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres { database_url } => Arc::new(
            store::PgStore::connect(database_url)
                .await
                .context("Failed to open PostgreSQL store")?,
        ),
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres { .. } => {
            anyhow::bail!("STORE_BACKEND=postgres requires building with --features postgres")
        }
    };

    // Probe once so an unreachable backend stops startup.
    let count = store
        .list()
        .await
        .context("Position store is not readable")?
        .len();
    info!(backend = %backend, positions = count, "✅ Position store ready");

    Ok(store)
}
