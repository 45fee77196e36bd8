use async_trait::async_trait;
use std::future::Future;

/// Work to run when shutdown is requested.
///
/// `manager` is the name of the [`crate::ShutdownManager`] that requested
/// the shutdown. Callbacks run concurrently with each other; one that blocks
/// should move its blocking part to `tokio::task::spawn_blocking`.
#[async_trait]
pub trait ShutdownCallback: Send + Sync + 'static {
    async fn on_shutdown(&self, manager: &str) -> anyhow::Result<()>;
}

/// Adapter turning an async closure into a [`ShutdownCallback`].
///
/// ```
/// use toolkit_shutdown::ShutdownFn;
///
/// let cb = ShutdownFn::new(|manager: String| async move {
///     println!("shutdown requested by {manager}");
///     Ok(())
/// });
/// # let _ = cb;
/// ```
pub struct ShutdownFn<F> {
    f: F,
}

impl<F, Fut> ShutdownFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> ShutdownCallback for ShutdownFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn on_shutdown(&self, manager: &str) -> anyhow::Result<()> {
        (self.f)(manager.to_owned()).await
    }
}

/// Receives errors surfaced asynchronously during startup or shutdown.
///
/// Any `Fn(anyhow::Error)` closure is an error handler.
pub trait ErrorHandler: Send + Sync + 'static {
    fn on_error(&self, err: anyhow::Error);
}

impl<F> ErrorHandler for F
where
    F: Fn(anyhow::Error) + Send + Sync + 'static,
{
    fn on_error(&self, err: anyhow::Error) {
        self(err);
    }
}

/// Named adapter for an error-handling closure.
///
/// Equivalent to passing the closure directly; useful where a concrete,
/// nameable type is wanted (struct fields, `impl Trait` returns).
pub struct ErrorFn<F>(F);

impl<F> ErrorFn<F>
where
    F: Fn(anyhow::Error) + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ErrorHandler for ErrorFn<F>
where
    F: Fn(anyhow::Error) + Send + Sync + 'static,
{
    fn on_error(&self, err: anyhow::Error) {
        (self.0)(err);
    }
}
