//! The `Coder` capability and its default implementation

use http::StatusCode;
use std::borrow::Cow;
use std::fmt;

use crate::catalog::is_allowed_status;

/// Business code reported for any error the registry does not recognize.
pub const UNKNOWN_CODE: u32 = 1;

/// User-facing message of the unknown coder.
pub const UNKNOWN_MESSAGE: &str = "An internal server error occurred";

/// A business condition that can be reported to an HTTP client.
pub trait Coder: Send + Sync + fmt::Debug {
    /// Integer business code. `0` is reserved and never registered.
    fn code(&self) -> u32;

    /// HTTP status that should be used for the associated error code.
    fn http_status(&self) -> StatusCode;

    /// External (user) facing error text.
    fn message(&self) -> &str;

    /// Reference document for the user; empty when there is none.
    fn reference(&self) -> &str;
}

/// Default `Coder` implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrCode {
    code: u32,
    status: u16,
    message: Cow<'static, str>,
    reference: Cow<'static, str>,
}

impl ErrCode {
    /// Create a coder for `code` reported with the given HTTP `status`.
    ///
    /// # Panics
    /// Panics if `status` is not one of `200, 400, 401, 403, 404, 500`.
    #[must_use]
    pub fn new(code: u32, status: u16, message: impl Into<Cow<'static, str>>) -> Self {
        assert!(
            is_allowed_status(status),
            "http status {status} not in `200, 400, 401, 403, 404, 500`"
        );
        Self {
            code,
            status,
            message: message.into(),
            reference: Cow::Borrowed(""),
        }
    }

    /// Build a coder without validating its status.
    ///
    /// A stored status of `0` reports `500` from [`Coder::http_status`].
    pub(crate) const fn unchecked(code: u32, status: u16, message: &'static str) -> Self {
        Self {
            code,
            status,
            message: Cow::Borrowed(message),
            reference: Cow::Borrowed(""),
        }
    }

    /// The sentinel returned for errors that are not registered coded errors.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::unchecked(UNKNOWN_CODE, 500, UNKNOWN_MESSAGE)
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<Cow<'static, str>>) -> Self {
        self.reference = reference.into();
        self
    }
}

impl Coder for ErrCode {
    fn code(&self) -> u32 {
        self.code
    }

    fn http_status(&self) -> StatusCode {
        if self.status == 0 {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn reference(&self) -> &str {
        &self.reference
    }
}

impl fmt::Display for ErrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
