//! JSON error envelope written to HTTP clients (pure data model, no HTTP framework dependencies)

use serde::{Deserialize, Serialize};

use crate::coder::Coder;

/// Error body returned to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrResponse {
    /// Business error code.
    pub code: u32,
    /// User-safe message of the resolved coder.
    pub message: String,
    /// Reference document which may help to solve this error. Omitted when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reference: String,
}

impl From<&dyn Coder> for ErrResponse {
    fn from(coder: &dyn Coder) -> Self {
        Self {
            code: coder.code(),
            message: coder.message().to_owned(),
            reference: coder.reference().to_owned(),
        }
    }
}
