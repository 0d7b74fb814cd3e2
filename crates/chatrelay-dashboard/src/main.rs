//! chatrelay dashboard server.
//!
//! - Config: `CHATRELAY_DASHBOARD_CONFIG` (default `chatrelay-dashboard.yaml`), built-in defaults if absent
//! - Admin feed runs on its own task and reconnects per `dashboard.reconnect_delay_ms`
//! - HTTP: `/stream`, `/healthz`, `/readyz`, `/metrics`

use std::net::SocketAddr;
use std::path::Path;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatrelay_core::error::{RelayError, Result};
use chatrelay_dashboard::config::{self, DashboardConfig};
use chatrelay_dashboard::{app_state::AppState, feed, router};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(code = e.code().as_str(), error = %e, "dashboard exited");
        std::process::exit(1);
    }
}

fn load_config() -> Result<DashboardConfig> {
    let path = std::env::var("CHATRELAY_DASHBOARD_CONFIG")
        .unwrap_or_else(|_| "chatrelay-dashboard.yaml".into());
    if Path::new(&path).exists() {
        return config::load_from_file(&path);
    }
    tracing::info!(%path, "no config file, using defaults");
    let cfg = DashboardConfig::default();
    cfg.validate()?;
    Ok(cfg)
}

async fn run() -> Result<()> {
    let cfg = load_config()?;
    let listen: SocketAddr = cfg
        .dashboard
        .listen
        .parse()
        .map_err(|e| RelayError::BadConfig(format!("dashboard.listen: {e}")))?;

    let state = AppState::new(cfg);
    let feed = feed::spawn(state.clone());
    let app = router::build_router(state);

    tracing::info!(%listen, "chatrelay-dashboard starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| RelayError::Internal(format!("bind {listen} failed: {e}")))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RelayError::Internal(format!("server failed: {e}")));

    feed.abort();
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("signal received, starting graceful shutdown");
}
