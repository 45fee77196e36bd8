//! Business error codes for the toolkit
//!
//! This crate provides pure data types for coded errors, with no dependencies
//! on HTTP frameworks. It includes:
//! - The `Coder` capability and its concrete `ErrCode`
//! - A process-wide `CodeRegistry` from business code to `Coder`
//! - `CodedError`, an error carrying a business code and a cause chain
//! - `ErrResponse`, the JSON error envelope written to HTTP clients
//! - Static catalog support (`CodeDef`)
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod coded;
pub mod coder;
pub mod envelope;
pub mod registry;

// Re-export commonly used types
pub use catalog::{
    ALLOWED_STATUSES, CodeDef, is_allowed_status, must_register_all, must_register_code,
    register_code,
};
pub use coded::{BoxError, CodedError, ResultExt, is_code, wrap_c};
pub use coder::{Coder, ErrCode, UNKNOWN_CODE, UNKNOWN_MESSAGE};
pub use envelope::ErrResponse;
pub use registry::{CodeRegistry, global, must_register, parse_coder, register};
