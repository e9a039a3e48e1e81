//! airwatch-api - air quality advisory service
//!
//! Serves classify/recommend and subscription endpoints over HTTP and runs
//! the background alert monitor.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use airwatch_api::db::{init_database, SqliteRegistry};
use airwatch_api::history::AlertHistory;
use airwatch_api::monitor::AlertMonitor;
use airwatch_api::sink::LogSink;
use airwatch_api::{build_router, AppState};
use airwatch_engine::config::TomlConfig;
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for airwatch-api
#[derive(Parser, Debug)]
#[command(name = "airwatch-api")]
#[command(about = "Air quality advisory and alerting service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "AIRWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "AIRWATCH_DATABASE")]
    database: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "AIRWATCH_PORT")]
    port: Option<u16>,

    /// Interface to bind (overrides config)
    #[arg(short, long, env = "AIRWATCH_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("airwatch_api={0},airwatch_engine={0},tower_http=info", config.logging.level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting airwatch-api v{}", env!("CARGO_PKG_VERSION"));

    let db_path = config.resolve_database_path(args.database.as_deref());
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let registry = Arc::new(SqliteRegistry::new(pool.clone()));
    let history = AlertHistory::new(
        chrono::Duration::minutes(config.monitor.cooldown_minutes),
        config.monitor.history_limit,
    );

    if config.monitor.enabled {
        let monitor = AlertMonitor::new(
            registry.clone(),
            pool.clone(),
            history.clone(),
            Arc::new(LogSink),
        );
        tokio::spawn(monitor.run(Duration::from_secs(config.monitor.interval_secs)));
    } else {
        info!("Alert monitor disabled");
    }

    let app = build_router(AppState::new(pool, registry, history));

    let bind = args.bind.unwrap_or(config.bind_address);
    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("airwatch-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
