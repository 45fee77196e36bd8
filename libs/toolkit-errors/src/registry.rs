//! Process-wide registry of business codes.
//!
//! Lifecycle:
//! - Codes are registered during program initialization, typically from a
//!   static catalog (see [`crate::catalog`]).
//! - At request time the registry is only read, to resolve errors into coders.
//!
//! Notes:
//! - Every mutation takes the write guard; lookups take the read guard, so
//!   late registrations are safe even while requests are served.
//! - Programmer mistakes (code `0`, duplicate `must_register`, disallowed
//!   status) panic: they are bugs in static setup and must fail loudly.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::{Arc, LazyLock};

use crate::catalog::is_allowed_status;
use crate::coded::CodedError;
use crate::coder::{Coder, ErrCode};

static GLOBAL: LazyLock<CodeRegistry> = LazyLock::new(CodeRegistry::new);

static UNKNOWN: LazyLock<Arc<dyn Coder>> = LazyLock::new(|| Arc::new(ErrCode::unknown()));

/// The process-wide registry.
#[must_use]
pub fn global() -> &'static CodeRegistry {
    &GLOBAL
}

/// Mapping from business code to [`Coder`].
pub struct CodeRegistry {
    codes: RwLock<HashMap<u32, Arc<dyn Coder>>>,
}

impl CodeRegistry {
    /// Create a registry holding only the unknown coder.
    #[must_use]
    pub fn new() -> Self {
        let unknown = Arc::clone(&UNKNOWN);
        let mut codes = HashMap::new();
        codes.insert(unknown.code(), unknown);
        Self {
            codes: RwLock::new(codes),
        }
    }
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeRegistry")
            .field("codes", &self.codes())
            .finish()
    }
}

fn validate(coder: &dyn Coder) {
    assert!(
        coder.code() != 0,
        "code `0` is reserved as the unknown error code"
    );
    let status = coder.http_status().as_u16();
    assert!(
        is_allowed_status(status),
        "code {}: http status {status} not in `200, 400, 401, 403, 404, 500`",
        coder.code()
    );
}

impl CodeRegistry {
    /// Register a coder, overriding any existing entry with the same code.
    ///
    /// # Panics
    /// Panics if the code is `0` or the coder reports a disallowed status.
    pub fn register<C>(&self, coder: C)
    where
        C: Coder + 'static,
    {
        self.register_shared(Arc::new(coder));
    }

    /// Same as [`CodeRegistry::register`] for an already shared coder.
    ///
    /// # Panics
    /// Panics if the code is `0` or the coder reports a disallowed status.
    pub fn register_shared(&self, coder: Arc<dyn Coder>) {
        validate(coder.as_ref());
        let mut w = self.codes.write();
        w.insert(coder.code(), coder);
    }

    /// Register a coder, refusing to replace an existing entry.
    ///
    /// # Panics
    /// Panics if the code is `0`, the coder reports a disallowed status, or the
    /// code is already registered. The existing entry is left unchanged.
    pub fn must_register<C>(&self, coder: C)
    where
        C: Coder + 'static,
    {
        self.must_register_shared(Arc::new(coder));
    }

    /// Same as [`CodeRegistry::must_register`] for an already shared coder.
    ///
    /// # Panics
    /// See [`CodeRegistry::must_register`].
    pub fn must_register_shared(&self, coder: Arc<dyn Coder>) {
        validate(coder.as_ref());
        let code = coder.code();
        let mut w = self.codes.write();
        assert!(!w.contains_key(&code), "code {code} already registered");
        w.insert(code, coder);
    }

    /// Registered coder for `code`, if any.
    #[must_use]
    pub fn lookup(&self, code: u32) -> Option<Arc<dyn Coder>> {
        self.codes.read().get(&code).cloned()
    }

    #[must_use]
    pub fn contains(&self, code: u32) -> bool {
        self.codes.read().contains_key(&code)
    }

    /// Introspection: total registered codes (including the unknown coder).
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.read().is_empty()
    }

    /// Sorted snapshot of every registered code.
    #[must_use]
    pub fn codes(&self) -> Vec<u32> {
        let mut codes: Vec<u32> = self.codes.read().keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    /// Resolve an error to its coder.
    ///
    /// - `None` resolves to `None`.
    /// - A [`CodedError`] whose code is registered resolves to that coder.
    /// - Anything else resolves to the unknown coder (code `1`, status 500).
    ///
    /// Only the top-level error is inspected; the cause chain is not walked.
    #[must_use]
    pub fn parse_coder(&self, err: Option<&(dyn StdError + 'static)>) -> Option<Arc<dyn Coder>> {
        let err = err?;
        if let Some(coded) = err.downcast_ref::<CodedError>()
            && let Some(coder) = self.lookup(coded.code())
        {
            return Some(coder);
        }
        Some(Arc::clone(&UNKNOWN))
    }
}

/// Register a coder on the process-wide registry, overriding existing entries.
///
/// # Panics
/// See [`CodeRegistry::register`].
pub fn register<C>(coder: C)
where
    C: Coder + 'static,
{
    GLOBAL.register(coder);
}

/// Register a coder on the process-wide registry, refusing duplicates.
///
/// # Panics
/// See [`CodeRegistry::must_register`].
pub fn must_register<C>(coder: C)
where
    C: Coder + 'static,
{
    GLOBAL.must_register(coder);
}

/// Resolve an error against the process-wide registry.
///
/// See [`CodeRegistry::parse_coder`].
#[must_use]
pub fn parse_coder(err: Option<&(dyn StdError + 'static)>) -> Option<Arc<dyn Coder>> {
    GLOBAL.parse_coder(err)
}
