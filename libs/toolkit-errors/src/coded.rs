//! `CodedError`: an error value carrying a business code and a cause chain.

use std::error::Error as StdError;
use std::fmt;

/// Boxed, thread-safe error used as the cause of a [`CodedError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error tagged with a business code.
///
/// `message` is developer-facing context attached at the wrapping site; the
/// user-facing text comes from the registered [`crate::Coder`].
///
/// `Display` prints the message of this link only; the alternate form
/// (`{:#}`) prints the whole chain joined with `": "`.
#[derive(Debug)]
pub struct CodedError {
    code: u32,
    message: String,
    cause: Option<BoxError>,
}

impl CodedError {
    /// Coded error with no cause.
    #[must_use]
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap `cause` under `code`.
    #[must_use]
    pub fn wrap(cause: impl Into<BoxError>, code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    #[must_use]
    pub fn code(&self) -> u32 {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Iterate over this error followed by every error in its cause chain.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        let mut next: Option<&(dyn StdError + 'static)> = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.source();
            Some(current)
        })
    }

    /// Returns `true` if this error or any coded error in its chain has `code`.
    #[must_use]
    pub fn is_code(&self, code: u32) -> bool {
        is_code(self, code)
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if f.alternate() {
            let mut source = self.source();
            while let Some(err) = source {
                write!(f, ": {err}")?;
                source = err.source();
            }
        }
        Ok(())
    }
}

impl StdError for CodedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Build a coded error around an optional cause.
///
/// A `None` cause yields a well-formed error with no cause.
#[must_use]
pub fn wrap_c<E>(cause: Option<E>, code: u32, message: impl Into<String>) -> CodedError
where
    E: Into<BoxError>,
{
    match cause {
        Some(cause) => CodedError::wrap(cause, code, message),
        None => CodedError::new(code, message),
    }
}

/// Reports whether `err`, or any coded error in its cause chain, carries `code`.
///
/// The walk stops at the first link that is not a [`CodedError`].
#[must_use]
pub fn is_code(err: &(dyn StdError + 'static), code: u32) -> bool {
    let mut current = err;
    loop {
        let Some(coded) = current.downcast_ref::<CodedError>() else {
            return false;
        };
        if coded.code == code {
            return true;
        }
        match coded.source() {
            Some(cause) => current = cause,
            None => return false,
        }
    }
}

/// Extension for attaching a business code to any fallible result.
///
/// ```
/// use toolkit_errors::{ResultExt, is_code};
///
/// fn read_config() -> Result<String, toolkit_errors::CodedError> {
///     std::fs::read_to_string("/definitely/not/here.yaml")
///         .with_code(100_101, "could not read configuration file")
/// }
///
/// let err = read_config().unwrap_err();
/// assert!(is_code(&err, 100_101));
/// ```
pub trait ResultExt<T> {
    /// Wrap the error, if any, in a [`CodedError`] with `code` and `message`.
    ///
    /// # Errors
    /// Returns the wrapped error when `self` is `Err`.
    fn with_code(self, code: u32, message: impl Into<String>) -> Result<T, CodedError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    fn with_code(self, code: u32, message: impl Into<String>) -> Result<T, CodedError> {
        self.map_err(|e| CodedError::wrap(e, code, message))
    }
}
