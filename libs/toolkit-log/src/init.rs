//! Subscriber construction from [`Options`].

use std::fs::OpenOptions;
use std::io;

use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Filter, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, fmt};

use crate::error::InitError;
use crate::options::{LogFormat, Options};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps the background writer threads alive.
///
/// Records still buffered are flushed when the guard is dropped, so hold it
/// until the end of `main`.
#[must_use = "dropping the guard stops log output"]
#[derive(Debug)]
pub struct LogGuard {
    _workers: Vec<WorkerGuard>,
}

impl Options {
    /// Build a subscriber for these options without installing it.
    ///
    /// Every entry of `output_paths` receives all records at or above the
    /// effective level; every entry of `error_output_paths` receives error
    /// records only. `stdout` and `stderr` name the standard streams, anything
    /// else is a file opened for append. `RUST_LOG`, when set, replaces the
    /// level for the main outputs.
    ///
    /// # Errors
    /// [`InitError::Invalid`] if validation fails, [`InitError::Output`] if a
    /// file output cannot be opened.
    pub fn build(&self) -> Result<(impl Subscriber + Send + Sync + 'static, LogGuard), InitError> {
        let errs = self.validate();
        if !errs.is_empty() {
            return Err(InitError::Invalid(errs));
        }
        let (level, format) = match (self.effective_level(), self.log_format()) {
            (Ok(level), Ok(format)) => (level, format),
            (Err(e), _) | (_, Err(e)) => return Err(InitError::Invalid(vec![e])),
        };

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut workers = Vec::new();

        for path in &self.output_paths {
            let (writer, guard) = open_output(path)?;
            let filter = EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(level).into())
                .from_env_lossy();
            layers.push(self.fmt_layer(format, writer, filter));
            workers.push(guard);
        }
        for path in &self.error_output_paths {
            let (writer, guard) = open_output(path)?;
            layers.push(self.fmt_layer(format, writer, LevelFilter::ERROR));
            workers.push(guard);
        }

        let subscriber = tracing_subscriber::registry().with(layers);
        Ok((subscriber, LogGuard { _workers: workers }))
    }

    /// Build the subscriber and install it as the global default.
    ///
    /// # Errors
    /// Everything [`Options::build`] returns, plus [`InitError::Install`] when
    /// a global subscriber is already set.
    pub fn init(&self) -> Result<LogGuard, InitError> {
        let (subscriber, guard) = self.build()?;
        subscriber.try_init()?;
        tracing::debug!(logger = %self.name, options = %self, "logging initialized");
        Ok(guard)
    }

    fn fmt_layer<F>(&self, format: LogFormat, writer: NonBlocking, filter: F) -> BoxedLayer
    where
        F: Filter<Registry> + Send + Sync + 'static,
    {
        let span_events = if self.development {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer()
            .with_writer(writer)
            .with_file(!self.disable_caller)
            .with_line_number(!self.disable_caller)
            .with_span_events(span_events);

        match format {
            LogFormat::Json => layer
                .json()
                .with_current_span(!self.disable_stacktrace)
                .with_span_list(!self.disable_stacktrace)
                .with_filter(filter)
                .boxed(),
            LogFormat::Console => layer
                .with_ansi(self.enable_color)
                .with_filter(filter)
                .boxed(),
        }
    }
}

fn open_output(path: &str) -> Result<(NonBlocking, WorkerGuard), InitError> {
    match path {
        "stdout" => Ok(tracing_appender::non_blocking(io::stdout())),
        "stderr" => Ok(tracing_appender::non_blocking(io::stderr())),
        file => {
            let sink = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .map_err(|source| InitError::Output {
                    path: file.to_owned(),
                    source,
                })?;
            Ok(tracing_appender::non_blocking(sink))
        }
    }
}
