//! Response handling and transformation.
//!
//! # Responsibilities
//! - Transform backend response for client
//! - Strip hop-by-hop headers
//! - Map routing and upstream failures to HTTP status codes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Unmatched requests are a normal 404, not an internal error
//! - Backend timeouts result in 504 Gateway Timeout

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;

use crate::http::forward::UpstreamError;

static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Response for a request no rule matched.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "No matching route found").into_response()
}

/// Response for a failed upstream call.
pub fn upstream_error(error: &UpstreamError) -> Response {
    let message = match error {
        UpstreamError::UnknownBackend(_) => "Backend not available",
        UpstreamError::Timeout(_) => "Upstream request timed out",
        UpstreamError::Request(_) | UpstreamError::Build(_) => "Upstream request failed",
    };
    (error.status_code(), message).into_response()
}

/// Convert a backend response into the client response.
pub fn from_upstream(response: axum::http::Response<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
