//! HTTP server lifecycle driven by the shutdown coordinator.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use toolkit_shutdown::managers::posix_signal::PosixSignalManager;
use toolkit_shutdown::{Coordinator, ShutdownFn};

use crate::api::{AppState, router};
use crate::config::AppConfig;

/// Serve until SIGINT/SIGTERM, then drain in-flight requests and return.
///
/// The signal manager is built with `without_exit` so that `main` returns
/// normally and the log guard flushes.
pub async fn run(config: AppConfig) -> Result<()> {
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    let state = AppState::default();
    let cancel = CancellationToken::new();
    let drained = Arc::new(Notify::new());

    let gs = Arc::new(Coordinator::new());
    gs.set_error_handler(Arc::new(|err: anyhow::Error| {
        tracing::error!(error = %err, "shutdown step failed");
    }));
    gs.add_shutdown_manager(Arc::new(PosixSignalManager::default().without_exit()));
    gs.add_shutdown_callback(Arc::new(ShutdownFn::new({
        let cancel = cancel.clone();
        let drained = drained.clone();
        move |manager: String| {
            let cancel = cancel.clone();
            let drained = drained.clone();
            async move {
                tracing::info!(%manager, "stopping HTTP server");
                cancel.cancel();
                drained.notified().await;
                Ok(())
            }
        }
    })));
    gs.add_shutdown_callback(Arc::new(ShutdownFn::new({
        let state = state.clone();
        move |_manager: String| {
            let state = state.clone();
            async move {
                tracing::info!(users = state.user_count(), "releasing user directory");
                state.clear();
                Ok(())
            }
        }
    })));
    gs.start().await?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");

    let shutdown = {
        let cancel = cancel.clone();
        async move { cancel.cancelled().await }
    };
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    drained.notify_one();
    tracing::info!("HTTP server stopped");
    Ok(())
}
