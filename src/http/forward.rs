//! Dispatch to the selected backend.
//!
//! # Responsibilities
//! - Rewrite the request URI to the backend address
//! - Preserve the client's Host header and request ID
//! - Bound the upstream call by the request timeout

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response, StatusCode, Uri, Version};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::http::response::strip_hop_by_hop;
use crate::resilience::{with_timeout, TimedOut};
use crate::upstream::{Backend, BackendRef};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Error talking to a backend.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("backend {0} is not registered")]
    UnknownBackend(BackendRef),

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("failed to build upstream request: {0}")]
    Build(#[from] axum::http::Error),
}

impl UpstreamError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::UnknownBackend(_) => StatusCode::SERVICE_UNAVAILABLE,
            UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Request(_) | UpstreamError::Build(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// The request target on `backend`: its base URL plus the original path and query.
pub fn upstream_uri(backend: &Backend, original: &Uri) -> Result<Uri, axum::http::Error> {
    let path_and_query = original.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let base = backend.base_url.as_str().trim_end_matches('/');
    Ok(format!("{}{}", base, path_and_query).parse::<Uri>()?)
}

/// Forward a request to `backend` and return its response.
pub async fn forward(
    client: &Client<HttpConnector, Body>,
    backend: &Backend,
    request: Request<Body>,
    peer: SocketAddr,
    timeout: Duration,
) -> Result<Response<Incoming>, UpstreamError> {
    let (mut parts, body) = request.into_parts();

    let uri = upstream_uri(backend, &parts.uri)?;

    // HTTP/2 clients send the host as :authority only.
    if !parts.headers.contains_key(header::HOST) {
        if let Some(value) = parts
            .uri
            .authority()
            .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        {
            parts.headers.insert(header::HOST, value);
        }
    }

    strip_hop_by_hop(&mut parts.headers);
    if let Ok(value) = HeaderValue::from_str(&peer.ip().to_string()) {
        parts.headers.append(X_FORWARDED_FOR, value);
    }

    parts.uri = uri;
    parts.version = Version::HTTP_11;
    let upstream = Request::from_parts(parts, body);

    match with_timeout(timeout, client.request(upstream)).await {
        Ok(result) => Ok(result?),
        Err(TimedOut(after)) => Err(UpstreamError::Timeout(after)),
    }
}
