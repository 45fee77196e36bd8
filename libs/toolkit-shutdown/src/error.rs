/// Errors returned by [`crate::Coordinator::start`].
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("shutdown manager '{manager}' failed to start: {source}")]
    ManagerStart {
        manager: String,
        #[source]
        source: anyhow::Error,
    },
}
