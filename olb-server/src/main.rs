//! Open Lesson Booking Server
//!
//! A headless booking backend for an online tutoring marketplace.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use olb_core::events::channels::{EventSenders, email_event_channel, meeting_room_event_channel};
use olb_core::framework::DatabaseProcessor;
use olb_core::mailer::Mailer;
use olb_core::meetings::MeetingClient;
use olb_core::processors::{MeetingJanitor, NotificationDispatcher};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Open Lesson Booking - headless tutoring-marketplace backend
#[derive(Parser, Debug)]
#[command(name = "olb-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./olb-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting olb-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Clients take a startup snapshot; the lockable sections are for
    // per-request secrets.
    let mailer = Mailer::new(
        loaded_config.mail.endpoint.clone(),
        loaded_config.mail.api_key.clone(),
        loaded_config.mail.from.clone(),
    );
    let meeting_client = Arc::new(MeetingClient::new(
        loaded_config.meetings.api_base.clone(),
        loaded_config.meetings.token_url.clone(),
        loaded_config.meetings.credentials.clone(),
    ));

    let shared_config = loaded_config.into_shared();

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
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
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Event channels and background processors
    let (email_tx, email_rx) = email_event_channel();
    let (room_tx, room_rx) = meeting_room_event_channel();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let dispatcher = NotificationDispatcher::new(
        DatabaseProcessor {
            pool: db_pool.clone(),
        },
        mailer,
        email_rx,
        shutdown_rx.clone(),
    );
    let dispatcher_handle = tokio::spawn(dispatcher.run());

    let janitor = MeetingJanitor::new(
        db_pool.clone(),
        meeting_client.clone(),
        room_rx,
        shutdown_rx,
    );
    let janitor_handle = tokio::spawn(janitor.run());

    let state = AppState::new(
        db_pool.clone(),
        shared_config,
        EventSenders::new(email_tx, room_tx),
        meeting_client,
    );

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Drain background processors
    let _ = shutdown_tx.send(true);
    let _ = dispatcher_handle.await;
    let _ = janitor_handle.await;

    shutdown_notify.notify_one();

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
