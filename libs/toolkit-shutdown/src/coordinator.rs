//! The graceful shutdown coordinator.
//!
//! Design notes:
//! - Managers are started in registration order; the first failure stops startup.
//! - Callbacks run concurrently, one tokio task each, behind a join barrier.
//! - Registration lists are snapshotted before dispatch, so no lock is held
//!   while callbacks run.
//! - Shutdown is single-shot: once a manager has triggered it, later triggers
//!   (from the same or another manager) are ignored.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinSet;

use crate::callback::{ErrorHandler, ShutdownCallback};
use crate::error::ShutdownError;
use crate::manager::{GracefulShutdown, ShutdownManager};

/// Owns shutdown managers and callbacks and orchestrates the shutdown sequence.
#[derive(Default)]
pub struct Coordinator {
    managers: RwLock<Vec<Arc<dyn ShutdownManager>>>,
    callbacks: RwLock<Vec<Arc<dyn ShutdownCallback>>>,
    error_handler: RwLock<Option<Arc<dyn ErrorHandler>>>,
    shutting_down: AtomicBool,
}

impl Coordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a manager that will listen for shutdown requests once started.
    pub fn add_shutdown_manager(&self, manager: Arc<dyn ShutdownManager>) {
        self.managers.write().push(manager);
    }

    /// Add a callback to run when shutdown is requested.
    pub fn add_shutdown_callback(&self, callback: Arc<dyn ShutdownCallback>) {
        self.callbacks.write().push(callback);
    }

    /// Install the error handler, replacing any previous one.
    pub fn set_error_handler(&self, handler: Arc<dyn ErrorHandler>) {
        *self.error_handler.write() = Some(handler);
    }

    /// Hand `err` to the error handler. Without a handler the error is dropped.
    pub fn report_error(&self, err: anyhow::Error) {
        let handler = self.error_handler.read().clone();
        match handler {
            Some(handler) => handler.on_error(err),
            None => tracing::debug!(error = %err, "shutdown: no error handler installed"),
        }
    }

    fn report_result(&self, result: anyhow::Result<()>) {
        if let Err(err) = result {
            self.report_error(err);
        }
    }

    /// Returns `true` once a shutdown sequence has begun.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn manager_count(&self) -> usize {
        self.managers.read().len()
    }

    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Start every manager in registration order.
    ///
    /// # Errors
    /// Returns [`ShutdownError::ManagerStart`] for the first manager that fails
    /// to start. Managers after it are not started; managers before it keep
    /// running.
    pub async fn start(self: &Arc<Self>) -> Result<(), ShutdownError> {
        let managers = self.managers.read().clone();
        let gs: Arc<dyn GracefulShutdown> = self.clone();
        for manager in managers {
            let name = manager.name().to_owned();
            tracing::debug!(manager = %name, "shutdown: starting manager");
            manager
                .start(gs.clone())
                .await
                .map_err(|source| ShutdownError::ManagerStart {
                    manager: name,
                    source,
                })?;
        }
        tracing::info!(
            managers = self.manager_count(),
            callbacks = self.callback_count(),
            "shutdown: coordinator started"
        );
        Ok(())
    }

    /// Run the shutdown sequence on behalf of `manager`.
    ///
    /// Phase order: `shutdown_start` → all callbacks (concurrently) →
    /// `shutdown_finish`. Every error is routed to the error handler; nothing
    /// is returned to the caller.
    pub async fn start_shutdown(&self, manager: Arc<dyn ShutdownManager>) {
        let name = manager.name().to_owned();
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            tracing::warn!(manager = %name, "shutdown: already in progress, ignoring trigger");
            return;
        }

        tracing::info!(manager = %name, "shutdown: phase start");
        self.report_result(manager.shutdown_start().await);

        let callbacks = self.callbacks.read().clone();
        tracing::info!(manager = %name, callbacks = callbacks.len(), "shutdown: phase callbacks");
        let mut tasks = JoinSet::new();
        for callback in callbacks {
            let name = name.clone();
            tasks.spawn(async move { callback.on_shutdown(&name).await });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => self.report_result(result),
                Err(e) => {
                    self.report_error(anyhow::anyhow!("shutdown callback panicked: {e}"));
                }
            }
        }

        tracing::info!(manager = %name, "shutdown: phase finish");
        self.report_result(manager.shutdown_finish().await);
    }
}

#[async_trait]
impl GracefulShutdown for Coordinator {
    async fn start_shutdown(&self, manager: Arc<dyn ShutdownManager>) {
        Coordinator::start_shutdown(self, manager).await;
    }

    fn report_error(&self, err: anyhow::Error) {
        Coordinator::report_error(self, err);
    }

    fn add_shutdown_callback(&self, callback: Arc<dyn ShutdownCallback>) {
        Coordinator::add_shutdown_callback(self, callback);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::callback::ShutdownFn;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Manager that records its lifecycle into a shared journal.
    struct RecordingManager {
        name: &'static str,
        journal: Journal,
        fail_start: bool,
        fail_phases: bool,
    }

    impl RecordingManager {
        fn new(name: &'static str, journal: Journal) -> Self {
            Self {
                name,
                journal,
                fail_start: false,
                fail_phases: false,
            }
        }
    }

    #[async_trait]
    impl ShutdownManager for RecordingManager {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(self: Arc<Self>, _gs: Arc<dyn GracefulShutdown>) -> anyhow::Result<()> {
            self.journal.lock().push(format!("start:{}", self.name));
            if self.fail_start {
                anyhow::bail!("{} cannot listen", self.name);
            }
            Ok(())
        }

        async fn shutdown_start(&self) -> anyhow::Result<()> {
            self.journal.lock().push("shutdown_start".to_owned());
            if self.fail_phases {
                anyhow::bail!("shutdown_start failed");
            }
            Ok(())
        }

        async fn shutdown_finish(&self) -> anyhow::Result<()> {
            self.journal.lock().push("shutdown_finish".to_owned());
            if self.fail_phases {
                anyhow::bail!("shutdown_finish failed");
            }
            Ok(())
        }
    }

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn recording_callback(
        journal: Journal,
        label: &'static str,
        delay: Duration,
        fail: bool,
    ) -> Arc<dyn ShutdownCallback> {
        Arc::new(ShutdownFn::new(move |manager: String| {
            let journal = journal.clone();
            async move {
                tokio::time::sleep(delay).await;
                journal.lock().push(format!("{label}:{manager}"));
                if fail {
                    anyhow::bail!("{label} failed");
                }
                Ok(())
            }
        }))
    }

    fn error_sink(gs: &Coordinator) -> Journal {
        let errors = journal();
        let sink = errors.clone();
        gs.set_error_handler(Arc::new(move |err: anyhow::Error| {
            sink.lock().push(err.to_string());
        }));
        errors
    }

    #[tokio::test]
    async fn managers_start_in_registration_order() {
        let j = journal();
        let gs = Arc::new(Coordinator::new());
        for name in ["first", "second", "third"] {
            gs.add_shutdown_manager(Arc::new(RecordingManager::new(name, j.clone())));
        }

        gs.start().await.unwrap();
        assert_eq!(*j.lock(), vec!["start:first", "start:second", "start:third"]);
    }

    #[tokio::test]
    async fn start_stops_at_first_failing_manager() {
        let j = journal();
        let gs = Arc::new(Coordinator::new());
        gs.add_shutdown_manager(Arc::new(RecordingManager::new("ok", j.clone())));
        gs.add_shutdown_manager(Arc::new(RecordingManager {
            fail_start: true,
            ..RecordingManager::new("broken", j.clone())
        }));
        gs.add_shutdown_manager(Arc::new(RecordingManager::new("never", j.clone())));

        let err = gs.start().await.unwrap_err();
        match &err {
            ShutdownError::ManagerStart { manager, source } => {
                assert_eq!(manager, "broken");
                assert_eq!(source.to_string(), "broken cannot listen");
            }
        }
        assert_eq!(*j.lock(), vec!["start:ok", "start:broken"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn callbacks_fan_out_concurrently() {
        let j = journal();
        let gs = Coordinator::new();
        gs.add_shutdown_callback(recording_callback(j.clone(), "a", Duration::from_millis(300), false));
        gs.add_shutdown_callback(recording_callback(j.clone(), "b", Duration::from_millis(100), false));
        gs.add_shutdown_callback(recording_callback(j.clone(), "c", Duration::from_millis(200), false));
        let manager = Arc::new(RecordingManager::new("TestManager", journal()));

        let started = Instant::now();
        gs.start_shutdown(manager).await;
        let elapsed = started.elapsed();

        let mut seen = j.lock().clone();
        seen.sort();
        assert_eq!(seen, vec!["a:TestManager", "b:TestManager", "c:TestManager"]);
        assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(550), "callbacks ran sequentially: {elapsed:?}");
    }

    #[tokio::test]
    async fn phases_are_strictly_ordered() {
        let j = journal();
        let gs = Coordinator::new();
        for label in ["a", "b", "c"] {
            gs.add_shutdown_callback(recording_callback(j.clone(), label, Duration::from_millis(10), false));
        }
        let manager = Arc::new(RecordingManager::new("m", j.clone()));

        gs.start_shutdown(manager).await;

        let entries = j.lock().clone();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries.first().map(String::as_str), Some("shutdown_start"));
        assert_eq!(entries.last().map(String::as_str), Some("shutdown_finish"));
    }

    #[tokio::test]
    async fn callback_error_is_reported_not_propagated() {
        let j = journal();
        let gs = Coordinator::new();
        let errors = error_sink(&gs);
        gs.add_shutdown_callback(recording_callback(j.clone(), "ok1", Duration::from_millis(20), false));
        gs.add_shutdown_callback(recording_callback(j.clone(), "fail", Duration::ZERO, true));
        gs.add_shutdown_callback(recording_callback(j.clone(), "ok2", Duration::from_millis(40), false));

        gs.start_shutdown(Arc::new(RecordingManager::new("m", journal()))).await;

        assert_eq!(*errors.lock(), vec!["fail failed"]);
        let mut ran = j.lock().clone();
        ran.sort();
        assert_eq!(ran, vec!["fail:m", "ok1:m", "ok2:m"]);
    }

    #[tokio::test]
    async fn manager_phase_errors_are_reported() {
        let gs = Coordinator::new();
        let errors = error_sink(&gs);
        let manager = Arc::new(RecordingManager {
            fail_phases: true,
            ..RecordingManager::new("m", journal())
        });

        gs.start_shutdown(manager).await;
        assert_eq!(
            *errors.lock(),
            vec!["shutdown_start failed", "shutdown_finish failed"]
        );
    }

    async fn explode(_manager: String) -> anyhow::Result<()> {
        panic!("callback blew up")
    }

    #[tokio::test]
    async fn panicking_callback_is_reported_and_siblings_finish() {
        let j = journal();
        let gs = Coordinator::new();
        let errors = error_sink(&gs);
        gs.add_shutdown_callback(Arc::new(ShutdownFn::new(explode)));
        gs.add_shutdown_callback(recording_callback(j.clone(), "ok", Duration::from_millis(10), false));

        gs.start_shutdown(Arc::new(RecordingManager::new("m", journal()))).await;

        assert_eq!(*j.lock(), vec!["ok:m"]);
        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("shutdown callback panicked"), "{errors:?}");
    }

    #[tokio::test]
    async fn errors_without_handler_are_dropped() {
        let gs = Coordinator::new();
        gs.add_shutdown_callback(recording_callback(journal(), "fail", Duration::ZERO, true));
        gs.report_error(anyhow::anyhow!("nobody listens"));
        gs.start_shutdown(Arc::new(RecordingManager::new("m", journal()))).await;
        assert!(gs.is_shutting_down());
    }

    #[test]
    fn set_error_handler_replaces_previous() {
        let gs = Coordinator::new();
        let first = error_sink(&gs);
        let second = error_sink(&gs);

        gs.report_error(anyhow::anyhow!("boom"));
        assert!(first.lock().is_empty());
        assert_eq!(*second.lock(), vec!["boom"]);
    }

    #[tokio::test]
    async fn second_trigger_is_ignored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gs = Coordinator::new();
        let counter = calls.clone();
        gs.add_shutdown_callback(Arc::new(ShutdownFn::new(move |_m: String| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })));
        let j = journal();

        gs.start_shutdown(Arc::new(RecordingManager::new("one", j.clone()))).await;
        gs.start_shutdown(Arc::new(RecordingManager::new("two", j.clone()))).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*j.lock(), vec!["shutdown_start", "shutdown_finish"]);
    }

    #[tokio::test]
    async fn empty_coordinator_still_runs_manager_phases() {
        let j = journal();
        let gs = Coordinator::new();
        assert!(!gs.is_shutting_down());
        gs.start_shutdown(Arc::new(RecordingManager::new("m", j.clone()))).await;
        assert_eq!(*j.lock(), vec!["shutdown_start", "shutdown_finish"]);
    }

    /// Manager that adds a callback through the handle it receives at start.
    struct SelfRegistering {
        journal: Journal,
    }

    #[async_trait]
    impl ShutdownManager for SelfRegistering {
        fn name(&self) -> &str {
            "SelfRegistering"
        }

        async fn start(self: Arc<Self>, gs: Arc<dyn GracefulShutdown>) -> anyhow::Result<()> {
            gs.add_shutdown_callback(recording_callback(
                self.journal.clone(),
                "added",
                Duration::ZERO,
                false,
            ));
            gs.report_error(anyhow::anyhow!("reported from start"));
            Ok(())
        }

        async fn shutdown_start(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn shutdown_finish(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn managers_use_the_handle() {
        let j = journal();
        let gs = Arc::new(Coordinator::new());
        let errors = error_sink(&gs);
        let manager = Arc::new(SelfRegistering { journal: j.clone() });
        gs.add_shutdown_manager(manager.clone());

        gs.start().await.unwrap();
        assert_eq!(gs.callback_count(), 1);
        assert_eq!(*errors.lock(), vec!["reported from start"]);

        gs.start_shutdown(manager).await;
        assert_eq!(*j.lock(), vec!["added:SelfRegistering"]);
    }
}
