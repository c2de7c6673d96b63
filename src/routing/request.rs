//! The routing view of an incoming request.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use thiserror::Error;

use crate::routing::matcher::normalize_host;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid value for header '{0}'")]
    InvalidHeaderValue(String),
}

/// Host, path and headers: everything the matcher looks at.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    host: String,
    path: String,
    headers: HeaderMap,
}

impl RouteRequest {
    /// Create a request with no headers. The host is normalized.
    pub fn new(host: &str, path: impl Into<String>) -> Self {
        Self {
            host: normalize_host(host),
            path: path.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Append a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, RequestError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RequestError::InvalidHeaderName(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| RequestError::InvalidHeaderValue(name.to_string()))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Extract the routing view of an HTTP request.
    ///
    /// The host comes from the Host header, falling back to the URI authority
    /// (HTTP/2 `:authority`).
    pub fn from_http<B>(req: &Request<B>) -> Self {
        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri().authority().map(|a| a.as_str()))
            .unwrap_or_default();

        Self {
            host: normalize_host(host),
            path: req.uri().path().to_string(),
            headers: req.headers().clone(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_prefers_host_header() {
        let req = Request::builder()
            .uri("http://ignored.example/v2/example?x=1")
            .header("Host", "Example.com:8080")
            .header("Version", "two")
            .body(())
            .unwrap();

        let route_req = RouteRequest::from_http(&req);
        assert_eq!(route_req.host(), "example.com");
        assert_eq!(route_req.path(), "/v2/example");
        assert_eq!(route_req.headers().get("version").unwrap(), "two");
    }

    #[test]
    fn test_from_http_falls_back_to_authority() {
        let req = Request::builder()
            .uri("http://example.net/")
            .body(())
            .unwrap();
        assert_eq!(RouteRequest::from_http(&req).host(), "example.net");
    }

    #[test]
    fn test_with_header_rejects_invalid_name() {
        assert!(RouteRequest::new("h", "/").with_header("bad name", "x").is_err());
    }
}
