//! Handler-facing error type.

use axum::response::{IntoResponse, Response};
use std::error::Error as StdError;
use std::fmt;
use toolkit_errors::{BoxError, CodedError};

use crate::response::error_response;

/// Error returned from axum handlers.
///
/// Any `std::error::Error` converts into it, so handlers can use `?` and
/// return `Result<Json<T>, ApiError>`. The response is rendered exactly like
/// [`crate::write_response`] renders an error: the coder is resolved from the
/// top-level error against the process-wide registry.
pub struct ApiError(BoxError);

impl ApiError {
    /// Shorthand for a coded error without a cause.
    #[must_use]
    pub fn code(code: u32, message: impl Into<String>) -> Self {
        Self(Box::new(CodedError::new(code, message)))
    }

    #[must_use]
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }

    #[must_use]
    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

impl<E> From<E> for ApiError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self(Box::new(err))
    }
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err: &(dyn StdError + 'static) = self.0.as_ref();
        error_response(toolkit_errors::global(), err)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn from_keeps_top_level_error() {
        let err: ApiError = CodedError::new(5, "ctx").into();
        assert!(err.inner().downcast_ref::<CodedError>().is_some());
        assert_eq!(err.to_string(), "ctx");
    }

    #[test]
    fn code_shorthand_builds_coded_error() {
        let err = ApiError::code(6, "ctx");
        let inner = err.into_inner();
        let coded = inner.downcast_ref::<CodedError>().unwrap();
        assert_eq!(coded.code(), 6);
    }
}
