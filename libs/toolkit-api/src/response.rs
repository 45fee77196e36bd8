use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;
use std::error::Error as StdError;
use std::sync::Arc;
use toolkit_errors::{CodeRegistry, ErrResponse};

/// Write an error or the response data into an HTTP response.
///
/// - No error: `data` as JSON with status 200.
/// - Error: the full chain is logged for operators, the error is resolved with
///   [`toolkit_errors::parse_coder`] against the process-wide registry, and the
///   `{code, message, reference?}` envelope is written with the coder's status.
pub fn write_response<T: Serialize>(err: Option<&(dyn StdError + 'static)>, data: T) -> Response {
    respond(toolkit_errors::global(), err, data)
}

/// Response writer bound to a specific registry.
///
/// Useful in tests, or when several registries coexist in one process.
#[derive(Debug, Clone)]
pub struct Responder {
    registry: Arc<CodeRegistry>,
}

impl Responder {
    #[must_use]
    pub fn new(registry: Arc<CodeRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &CodeRegistry {
        &self.registry
    }

    /// Same contract as [`write_response`], resolving codes against this registry.
    pub fn write_response<T: Serialize>(
        &self,
        err: Option<&(dyn StdError + 'static)>,
        data: T,
    ) -> Response {
        respond(&self.registry, err, data)
    }
}

pub(crate) fn respond<T: Serialize>(
    registry: &CodeRegistry,
    err: Option<&(dyn StdError + 'static)>,
    data: T,
) -> Response {
    let Some(err) = err else {
        return (StatusCode::OK, Json(data)).into_response();
    };
    error_response(registry, err)
}

pub(crate) fn error_response(registry: &CodeRegistry, err: &(dyn StdError + 'static)) -> Response {
    let Some(coder) = registry.parse_coder(Some(err)) else {
        // parse_coder only yields None for a missing error
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let status = coder.http_status();
    tracing::error!(
        code = coder.code(),
        status = status.as_u16(),
        error = %render_chain(err),
        "request failed"
    );

    (status, Json(ErrResponse::from(coder.as_ref()))).into_response()
}

/// `outer: inner: root` rendering of an error and its sources.
pub(crate) fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        out.push_str(": ");
        out.push_str(&e.to_string());
        source = e.source();
    }
    out
}
