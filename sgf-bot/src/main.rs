//! sgf-bot - steel grade finder conversation service
//!
//! Loads the grade catalog once at startup and serves the chat transport's
//! event, broadcast and health endpoints until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use sgf_bot::broadcast::WebhookTransport;
use sgf_bot::recorder::LogFileSink;
use sgf_bot::{build_router, ActivityRecorder, AppState, Broadcaster};
use sgf_common::config::TomlConfig;
use sgf_common::db::{init_database, load_catalog};
use sgf_common::logging::init_tracing;
use sgf_common::{ElementSet, GradeCatalog};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "sgf-bot", version, about = "Steel grade finder conversation service")]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "SGF_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the catalog database and activity logs
    #[arg(long, env = "SGF_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// HTTP port (overrides [bot].port)
    #[arg(short, long, env = "SGF_PORT")]
    port: Option<u16>,

    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize logging")?;

    // Build identification first, before any database work
    info!(
        "Starting Steel Grade Finder bot (sgf-bot) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = config.resolve_root_folder(args.root_folder.as_deref());
    info!("Root folder: {}", root_folder.display());

    let db_path = config.database_path(&root_folder);
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open catalog database {}", db_path.display()))?;

    let catalog = match load_catalog(&pool).await.context("Failed to load catalog")? {
        Some(catalog) => {
            info!(
                grades = catalog.len(),
                elements = catalog.elements().len(),
                "Catalog loaded"
            );
            catalog
        }
        None => {
            warn!("Catalog is empty, every search will report no match. Import one with sgf-import");
            GradeCatalog::empty(Arc::new(ElementSet::default_steel()))
        }
    };
    // Catalog is read-only from here on
    pool.close().await;

    if let Some(required) = config.catalog.required_elements()? {
        if &required != catalog.elements().as_ref() {
            warn!(
                configured = ?required.symbols(),
                catalog = ?catalog.elements().symbols(),
                "Configured tracked elements differ from the catalog; using the catalog's"
            );
        }
    }
    catalog.warn_unsatisfiable_ranges(config.catalog.null_bound_policy);

    let activity_dir = config.activity_dir(&root_folder);
    info!("Activity log directory: {}", activity_dir.display());
    let sink = LogFileSink::new(activity_dir, config.activity.file_prefix.clone());

    let mut state = AppState::new(Arc::new(catalog), ActivityRecorder::new(Arc::new(sink)))
        .with_policy(config.catalog.null_bound_policy)
        .with_input_mode(config.bot.input_mode);

    match &config.bot.outbound_url {
        Some(url) => {
            let transport = WebhookTransport::new(url.clone())
                .context("Failed to create outbound transport")?;
            let pacing = Duration::from_millis(config.bot.broadcast_pacing_ms);
            state = state.with_broadcaster(Broadcaster::new(Arc::new(transport), pacing));
            info!("Broadcast enabled via {} ({:?} between sends)", url, pacing);
        }
        None => info!("No outbound_url configured, broadcast disabled"),
    }

    let app = build_router(state);

    let port = args.port.unwrap_or(config.bot.port);
    let addr = format!("{}:{}", args.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("sgf-bot listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
