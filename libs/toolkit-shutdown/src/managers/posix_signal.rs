//! Shutdown manager driven by POSIX signals.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

use crate::manager::{GracefulShutdown, ShutdownManager};

/// Name reported to callbacks when this manager triggers shutdown.
pub const NAME: &str = "PosixSignalManager";

const IDLE: u8 = 0;
const LISTENING: u8 = 1;
const TRIGGERED: u8 = 2;

/// Lifecycle of a [`PosixSignalManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Created, not started.
    Idle,
    /// Signal listeners installed, waiting for a signal.
    Listening,
    /// A signal arrived and shutdown was requested. Terminal.
    Triggered,
}

#[derive(Debug, thiserror::Error)]
pub enum PosixSignalError {
    #[error("posix signal manager already started")]
    AlreadyStarted,
    #[error("failed to install handler for signal {signal}: {source}")]
    Install {
        signal: i32,
        #[source]
        source: std::io::Error,
    },
}

/// Requests shutdown when the process receives one of the configured signals.
///
/// Services a single trigger: after the first signal it requests shutdown
/// once, and `shutdown_finish` exits the process with code 0.
#[derive(Debug)]
pub struct PosixSignalManager {
    signals: Vec<SignalKind>,
    state: AtomicU8,
    exit_on_finish: bool,
}

impl PosixSignalManager {
    /// Listen for `signals`; an empty set means SIGINT and SIGTERM.
    #[must_use]
    pub fn new(signals: impl IntoIterator<Item = SignalKind>) -> Self {
        let mut signals: Vec<SignalKind> = signals.into_iter().collect();
        if signals.is_empty() {
            signals = vec![SignalKind::interrupt(), SignalKind::terminate()];
        }
        Self {
            signals,
            state: AtomicU8::new(IDLE),
            exit_on_finish: true,
        }
    }

    /// Keep the process alive after shutdown finishes; the host decides when to exit.
    #[must_use]
    pub fn without_exit(mut self) -> Self {
        self.exit_on_finish = false;
        self
    }

    #[must_use]
    pub fn signals(&self) -> &[SignalKind] {
        &self.signals
    }

    #[must_use]
    pub fn state(&self) -> ManagerState {
        match self.state.load(Ordering::Acquire) {
            IDLE => ManagerState::Idle,
            LISTENING => ManagerState::Listening,
            _ => ManagerState::Triggered,
        }
    }
}

impl Default for PosixSignalManager {
    fn default() -> Self {
        Self::new([])
    }
}

#[async_trait]
impl ShutdownManager for PosixSignalManager {
    fn name(&self) -> &str {
        NAME
    }

    async fn start(self: Arc<Self>, gs: Arc<dyn GracefulShutdown>) -> anyhow::Result<()> {
        if self
            .state
            .compare_exchange(IDLE, LISTENING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PosixSignalError::AlreadyStarted.into());
        }

        // Install every listener before returning so no signal is missed.
        let mut listeners = Vec::with_capacity(self.signals.len());
        for kind in &self.signals {
            match signal(*kind) {
                Ok(listener) => listeners.push((*kind, listener)),
                Err(source) => {
                    self.state.store(IDLE, Ordering::Release);
                    tracing::error!(%source, signal = kind.as_raw_value(), "Failed to install signal handler");
                    return Err(PosixSignalError::Install {
                        signal: kind.as_raw_value(),
                        source,
                    }
                    .into());
                }
            }
        }

        let (tx, mut rx) = mpsc::channel::<SignalKind>(1);
        let forwarders: Vec<_> = listeners
            .into_iter()
            .map(|(kind, mut listener)| {
                let tx = tx.clone();
                tokio::spawn(async move {
                    if listener.recv().await.is_some()
                        && let Err(e) = tx.try_send(kind)
                    {
                        // Slot already holds the first signal.
                        tracing::trace!(error = %e, "dropping duplicate shutdown signal");
                    }
                })
            })
            .collect();
        drop(tx);

        tracing::debug!(signals = ?self.signals, "posix signal manager listening");
        tokio::spawn(async move {
            let Some(kind) = rx.recv().await else {
                return;
            };
            for forwarder in &forwarders {
                forwarder.abort();
            }
            tracing::info!(signal = kind.as_raw_value(), "Shutdown signal received, initiating graceful shutdown");
            self.state.store(TRIGGERED, Ordering::Release);
            gs.start_shutdown(self).await;
        });

        Ok(())
    }

    async fn shutdown_start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn shutdown_finish(&self) -> anyhow::Result<()> {
        if self.exit_on_finish {
            tracing::info!("graceful shutdown complete, exiting");
            std::process::exit(0);
        }
        Ok(())
    }
}
