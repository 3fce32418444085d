mod logging;
mod reload;
mod routes;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use calapi_core::config::{ConfigProvider, FileConfigProvider};
use calapi_core::{CalendarService, RefreshScheduler};

use crate::reload::ConfigWatcher;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "calapi-server")]
#[command(about = "Serve today's events aggregated from iCal sources", version)]
struct Args {
    /// Path to the config file (default: ./config.yaml, then the user config dir, then /data)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level in human-readable form
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let provider = FileConfigProvider::discover(args.config.as_deref())?;
    let server = provider
        .server()
        .with_context(|| format!("Failed to load {}", provider.path().display()))?;

    logging::init(args.debug || server.debug);
    info!(path = %provider.path().display(), "Loaded config");

    let config: Arc<dyn ConfigProvider> = Arc::new(provider.clone());
    let service = Arc::new(CalendarService::new(config));

    let mut scheduler = RefreshScheduler::new(Arc::clone(service.cache()));
    scheduler.start(server.refresh_interval()).await;

    let shutdown = CancellationToken::new();
    let watcher = ConfigWatcher::new(provider, server.clone(), scheduler);
    let watcher = tokio::spawn(watcher.run(shutdown.clone()));

    let app = routes::router(AppState::new(service));

    let addr = server.http_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "calapi-server listening");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutting down");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    watcher.await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
