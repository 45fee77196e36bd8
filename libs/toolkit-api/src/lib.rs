//! HTTP response mapping for coded errors
//!
//! Turns either a success payload or an error into an axum `Response`. Errors
//! are resolved into a [`toolkit_errors::Coder`] and written as the
//! `{code, message, reference?}` envelope; internal detail is only logged.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod error;
pub mod response;

pub use error::ApiError;
pub use response::{Responder, write_response};

/// Result alias for axum handlers.
pub type ApiResult<T> = Result<T, ApiError>;
