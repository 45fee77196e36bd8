//! Business error codes served by the demo API.

use std::sync::Once;

use toolkit_errors::CodeDef;

pub const BIND_BODY: CodeDef =
    CodeDef::new(100_003, 400, "Error occurred while binding the request body")
        .with_reference("docs/errors.md#100003");
pub const VALIDATION: CodeDef = CodeDef::new(100_004, 400, "Validation failed");
pub const USER_NOT_FOUND: CodeDef = CodeDef::new(110_001, 404, "User not found");
pub const USER_EXISTS: CodeDef = CodeDef::new(110_002, 400, "User already exists");

pub const CATALOG: [CodeDef; 4] = [BIND_BODY, VALIDATION, USER_NOT_FOUND, USER_EXISTS];

/// Register the catalog on the process-wide registry. Safe to call more than once.
pub fn register() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| toolkit_errors::must_register_all(&CATALOG));
}
