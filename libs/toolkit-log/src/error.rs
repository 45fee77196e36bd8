/// A single problem found by [`crate::Options::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("unrecognized level: \"{0}\"")]
    UnrecognizedLevel(String),
    #[error("not a valid log format: \"{0}\"")]
    InvalidFormat(String),
}

/// Errors returned while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("invalid logging options: {}", join(.0))]
    Invalid(Vec<OptionsError>),
    #[error("failed to open log output '{path}': {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to install global subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

fn join(errs: &[OptionsError]) -> String {
    errs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
