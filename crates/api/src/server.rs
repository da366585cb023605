//! Server bootstrap: storage selection, binding, graceful shutdown.
//!
//! On SIGINT/SIGTERM the listener stops accepting and in-flight requests are
//! drained. If draining takes longer than `SHUTDOWN_TIMEOUT_SECS` the process
//! exits with status 1.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use roster_infra::{db, AppConfig, InMemoryUserRepository, PostgresUserRepository, UserRepository};

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store.
pub async fn open_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn UserRepository>> {
    match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, config.database_max_connections)
                .await
                .context("could not connect to the database")?;
            let repo = PostgresUserRepository::new(pool);
            repo.ensure_schema()
                .await
                .context("could not create the users table")?;
            Ok(Arc::new(repo))
        }
        None => {
            warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
            Ok(Arc::new(InMemoryUserRepository::new()))
        }
    }
}

/// Bind and serve until a shutdown signal arrives and the drain completes.
pub async fn serve(config: &AppConfig, app: Router) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, mode = %config.mode, "server started");

    let drain_timeout = config.shutdown_timeout;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let signal = shutdown_signal().await;
            info!(signal, "shutdown signal received, draining connections");
            tokio::spawn(force_exit_after(drain_timeout));
        })
        .await
        .context("server error")?;

    info!("server closed");
    Ok(())
}

async fn force_exit_after(timeout: Duration) {
    tokio::time::sleep(timeout).await;
    error!(timeout_secs = timeout.as_secs(), "forced shutdown after timeout");
    std::process::exit(1);
}

/// Resolves with the name of the first shutdown signal received.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => "SIGINT",
        () = sigterm => "SIGTERM",
    }
}
