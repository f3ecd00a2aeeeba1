//! RFC 7807 error responses.
//!
//! Every error body is `application/problem+json` with `type`, `title`,
//! `status` and `detail`. `title` carries the machine-stable reason;
//! `detail` the human-readable text. The store error taxonomy maps to
//! status codes in exactly one place, here.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::store::StoreError;

#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    problem_type: &'static str,
    title: String,
    status: u16,
    detail: String,
}

/// Build a problem+json response.
pub fn problem(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Response {
    let body = ProblemDetails {
        problem_type: "about:blank",
        title: title.into(),
        status: status.as_u16(),
        detail: detail.into(),
    };
    let json = serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string());

    (
        status,
        [(header::CONTENT_TYPE, "application/problem+json")],
        json,
    )
        .into_response()
}

pub fn bad_request(detail: impl Into<String>) -> Response {
    problem(StatusCode::BAD_REQUEST, "validation_failed", detail)
}

pub fn not_found(detail: impl Into<String>) -> Response {
    problem(StatusCode::NOT_FOUND, "not_found", detail)
}

pub fn internal_error(detail: impl Into<String>) -> Response {
    problem(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", detail)
}

/// Map a store error onto the wire contract:
/// `InvalidIdentifier`/`Validation` → 400, `Forbidden` → 403,
/// `NotFound` → 404, backend failures → 500.
pub fn from_store_error(err: &StoreError) -> Response {
    let status = match err {
        StoreError::InvalidIdentifier { .. } | StoreError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        StoreError::Forbidden { .. } => StatusCode::FORBIDDEN,
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::BackendIo { .. } | StoreError::BackendData { .. } => {
            error!(error = %err, "store unavailable");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    problem(status, err.reason(), err.to_string())
}
