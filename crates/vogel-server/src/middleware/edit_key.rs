//! Edit-key guard.
//!
//! Every request that is not `GET`, `HEAD` or `OPTIONS` must present the
//! configured edit key, either in the `x-edit-key` header or in the
//! `edit_key` query parameter. Read-only requests pass untouched.

use axum::extract::{Query, State};
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use vogel_core::Error;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Header carrying the edit key.
pub const EDIT_KEY_HEADER: &str = "x-edit-key";

#[derive(Debug, Default, Deserialize)]
struct EditKeyQuery {
    edit_key: Option<String>,
}

/// Whether `method` needs the edit key.
pub fn requires_edit_key(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Check a presented key against the configured one.
///
/// An empty configured key means the server cannot authorise any write.
pub fn check_edit_key(expected: &str, provided: Option<&str>) -> vogel_core::Result<()> {
    if expected.is_empty() {
        return Err(Error::Misconfigured("missing EDIT_LINK_KEY".into()));
    }
    match provided {
        Some(key) if keys_match(expected, key) => Ok(()),
        _ => Err(Error::Forbidden("invalid or missing edit key".into())),
    }
}

/// Constant-time comparison. Hashing first makes the comparison length
/// independent of the presented key.
fn keys_match(expected: &str, provided: &str) -> bool {
    let a = Sha256::digest(expected.as_bytes());
    let b = Sha256::digest(provided.as_bytes());
    a.as_slice().ct_eq(b.as_slice()).into()
}

/// Axum middleware enforcing the edit key on mutating requests.
pub async fn edit_key_middleware(
    State(ctx): State<AppContext>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if !requires_edit_key(request.method()) {
        return next.run(request).await;
    }

    let from_header = request
        .headers()
        .get(EDIT_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from);
    let provided = from_header.or_else(|| {
        Query::<EditKeyQuery>::try_from_uri(request.uri())
            .ok()
            .and_then(|Query(q)| q.edit_key)
    });

    match check_edit_key(&ctx.config.auth.edit_key, provided.as_deref()) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "Rejected write: {e}"
            );
            let mut err = AppError::new(e);
            if let Some(RequestId(id)) = request.extensions().get::<RequestId>() {
                err = err.with_request_id(id.clone());
            }
            err.into_response()
        }
    }
}
