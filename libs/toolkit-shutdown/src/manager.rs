use async_trait::async_trait;
use std::sync::Arc;

use crate::callback::ShutdownCallback;

/// A pluggable source of shutdown triggers.
///
/// Lifecycle: `start` → (trigger) → `shutdown_start` → callbacks → `shutdown_finish`.
#[async_trait]
pub trait ShutdownManager: Send + Sync + 'static {
    /// Stable name, passed to every callback when this manager triggers shutdown.
    fn name(&self) -> &str;

    /// Begin listening for shutdown requests.
    ///
    /// Must return promptly; listening happens on a background task which
    /// calls [`GracefulShutdown::start_shutdown`] once a request arrives.
    async fn start(self: Arc<Self>, gs: Arc<dyn GracefulShutdown>) -> anyhow::Result<()>;

    /// Called before any callback runs.
    async fn shutdown_start(&self) -> anyhow::Result<()>;

    /// Called after every callback has returned.
    async fn shutdown_finish(&self) -> anyhow::Result<()>;
}

/// The handle shutdown managers use to drive the coordinator.
#[async_trait]
pub trait GracefulShutdown: Send + Sync + 'static {
    /// Run the shutdown sequence on behalf of `manager`.
    async fn start_shutdown(&self, manager: Arc<dyn ShutdownManager>);

    /// Hand an error to the installed error handler, if any.
    fn report_error(&self, err: anyhow::Error);

    fn add_shutdown_callback(&self, callback: Arc<dyn ShutdownCallback>);
}
