//! Logging configuration for toolkit services
//!
//! [`Options`] is the single logging config surface: it deserializes from the
//! `logging` section of a config file, binds to `--log.*` command-line flags,
//! validates itself, and installs the process-wide `tracing` subscriber.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod error;
pub mod init;
pub mod options;

pub use error::{InitError, OptionsError};
pub use init::LogGuard;
pub use options::{LogFormat, Options, parse_level};
