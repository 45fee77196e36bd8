//! Graceful shutdown coordination
//!
//! A [`Coordinator`] owns a list of [`ShutdownManager`]s (sources of shutdown
//! triggers, e.g. POSIX signals) and [`ShutdownCallback`]s (work to run at
//! shutdown). When a manager fires, the coordinator:
//!
//! 1. calls [`ShutdownManager::shutdown_start`],
//! 2. runs every callback concurrently and waits for all of them,
//! 3. calls [`ShutdownManager::shutdown_finish`].
//!
//! Errors from any of those steps never abort the sequence; they are handed to
//! the installed [`ErrorHandler`], or dropped when none is installed.
//!
//! ```no_run
//! use std::sync::Arc;
//! use toolkit_shutdown::{Coordinator, ShutdownFn, managers::posix_signal::PosixSignalManager};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let gs = Arc::new(Coordinator::new());
//! gs.add_shutdown_manager(Arc::new(PosixSignalManager::new([])));
//! gs.add_shutdown_callback(Arc::new(ShutdownFn::new(|manager: String| async move {
//!     tracing::info!(%manager, "flushing buffers");
//!     Ok(())
//! })));
//! gs.set_error_handler(Arc::new(|err: anyhow::Error| tracing::error!(error = %err, "shutdown")));
//! gs.start().await?;
//! # Ok(())
//! # }
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod callback;
pub mod coordinator;
pub mod error;
pub mod manager;
pub mod managers;

pub use callback::{ErrorFn, ErrorHandler, ShutdownCallback, ShutdownFn};
pub use coordinator::Coordinator;
pub use error::ShutdownError;
pub use manager::{GracefulShutdown, ShutdownManager};
