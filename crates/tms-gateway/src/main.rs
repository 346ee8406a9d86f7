use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod app;
mod auth;
mod http;

/// Training management gateway: schedule status reconciliation over HTTP.
#[derive(Debug, Parser)]
#[command(name = "tms-gateway", version)]
struct Cli {
    /// Path to tms.toml (defaults to ~/.tms/tms.toml).
    #[arg(long, env = "TMS_CONFIG")]
    config: Option<String>,

    /// Run one bulk reconciliation, print the report as JSON and exit.
    #[arg(long)]
    reconcile_once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tms_gateway=info,tms_schedules=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // A config that fails to load must not silently drop the bearer secret.
    let config = tms_core::config::TmsConfig::load(cli.config.as_deref())?;

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    // One store for the whole process; every request goes through it.
    let store = Arc::new(tms_schedules::SqliteScheduleStore::new(db)?);
    info!("database migrations complete");

    let state = Arc::new(app::AppState::new(config, store));

    if cli.reconcile_once {
        let report = state
            .reconciler
            .reconcile_all(tms_schedules::local_today())?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // optional in-process daily trigger
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    if let Some(secs) = state.config.reconcile.interval_secs.filter(|s| *s > 0) {
        let engine = tms_schedules::ReconcileEngine::new(
            state.reconciler.clone(),
            Duration::from_secs(secs),
        );
        tokio::spawn(async move { engine.run(shutdown_rx).await });
    } else {
        info!("no reconcile.interval_secs set; waiting for external triggers");
    }

    let addr: SocketAddr = state.config.listen_addr().parse()?;
    let router = app::build_router(state.clone());
    info!("TMS gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // signal reconcile engine to stop
    let _ = shutdown_tx.send(true);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
