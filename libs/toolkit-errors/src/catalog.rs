//! Error catalog support (`CodeDef` for static code tables)

use crate::coder::ErrCode;
use crate::registry::CodeRegistry;

/// HTTP statuses a registered coder may report.
pub const ALLOWED_STATUSES: [u16; 6] = [200, 400, 401, 403, 404, 500];

/// Returns `true` if `status` is one of [`ALLOWED_STATUSES`].
#[inline]
#[must_use]
pub fn is_allowed_status(status: u16) -> bool {
    ALLOWED_STATUSES.contains(&status)
}

/// Static code definition from a catalog
///
/// ```
/// use toolkit_errors::CodeDef;
///
/// const USER_NOT_FOUND: CodeDef = CodeDef::new(110_001, 404, "User not found");
/// const BIND: CodeDef = CodeDef::new(100_003, 400, "Error occurred while binding the request body")
///     .with_reference("https://docs.example.com/errors/100003");
///
/// toolkit_errors::must_register_all(&[USER_NOT_FOUND, BIND]);
/// assert!(toolkit_errors::global().contains(110_001));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeDef {
    pub code: u32,
    pub status: u16,
    pub message: &'static str,
    pub reference: &'static str,
}

impl CodeDef {
    #[must_use]
    pub const fn new(code: u32, status: u16, message: &'static str) -> Self {
        Self {
            code,
            status,
            message,
            reference: "",
        }
    }

    #[must_use]
    pub const fn with_reference(mut self, reference: &'static str) -> Self {
        self.reference = reference;
        self
    }

    /// Convert this definition into a validated [`ErrCode`].
    ///
    /// A definition is only ever registered through this conversion, so the
    /// stored status is checked as written.
    ///
    /// # Panics
    /// Panics if the status is not one of [`ALLOWED_STATUSES`].
    #[must_use]
    pub fn to_coder(&self) -> ErrCode {
        ErrCode::new(self.code, self.status, self.message).with_reference(self.reference)
    }
}

/// Register every definition on the process-wide registry, refusing duplicates.
///
/// # Panics
/// Panics on the first definition that uses code `0`, a disallowed status,
/// or a code that is already registered.
pub fn must_register_all(defs: &[CodeDef]) {
    must_register_all_in(crate::registry::global(), defs);
}

/// Register every definition on `registry`, refusing duplicates.
///
/// # Panics
/// Same conditions as [`must_register_all`].
pub fn must_register_all_in(registry: &CodeRegistry, defs: &[CodeDef]) {
    for def in defs {
        registry.must_register(def.to_coder());
    }
}

/// Build an [`ErrCode`] and register it on the process-wide registry,
/// overwriting any previous entry for `code`.
///
/// # Panics
/// Panics if `code` is `0` or `status` is not one of [`ALLOWED_STATUSES`].
pub fn register_code(code: u32, status: u16, message: &'static str, reference: &'static str) {
    crate::registry::register(ErrCode::new(code, status, message).with_reference(reference));
}

/// Like [`register_code`], but refuses to replace an existing entry.
///
/// # Panics
/// Panics if `code` is `0`, `status` is not allowed, or `code` is already registered.
pub fn must_register_code(code: u32, status: u16, message: &'static str, reference: &'static str) {
    crate::registry::must_register(ErrCode::new(code, status, message).with_reference(reference));
}
