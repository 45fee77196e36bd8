//! Built-in shutdown managers.

#[cfg(unix)]
pub mod posix_signal;
