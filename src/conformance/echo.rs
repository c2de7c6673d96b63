//! Echo backend: reports who answered and what it received.

use axum::{
    body::Body,
    extract::State,
    http::{header::HOST, Request},
    routing::any,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::upstream::BackendRef;

/// Body returned for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoResponse {
    pub backend: String,
    pub namespace: String,
    pub host: String,
    pub path: String,
    pub method: String,
    /// Lowercase header names; repeated headers are joined with ", ".
    pub headers: BTreeMap<String, String>,
}

async fn echo(State(backend): State<Arc<BackendRef>>, request: Request<Body>) -> Json<EchoResponse> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in request.headers() {
        let Ok(value) = value.to_str() else { continue };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();

    Json(EchoResponse {
        backend: backend.name.clone(),
        namespace: backend.namespace.clone(),
        host,
        path: request.uri().path().to_string(),
        method: request.method().to_string(),
        headers,
    })
}

pub fn echo_router(backend: BackendRef) -> Router {
    Router::new()
        .route("/", any(echo))
        .route("/{*path}", any(echo))
        .with_state(Arc::new(backend))
}

/// Serve the echo backend on `listener` until the task is dropped.
pub async fn serve(listener: TcpListener, backend: BackendRef) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, backend = %backend, "Echo backend listening");
    axum::serve(listener, echo_router(backend)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_echo_reports_identity_and_request() {
        let router = echo_router(BackendRef::new("infra-backend-v1", "gateway-conformance-infra"));
        let request = Request::builder()
            .uri("/v2/example")
            .header(HOST, "example.com")
            .header("Version", "one")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let echo: EchoResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(echo.backend, "infra-backend-v1");
        assert_eq!(echo.namespace, "gateway-conformance-infra");
        assert_eq!(echo.host, "example.com");
        assert_eq!(echo.path, "/v2/example");
        assert_eq!(echo.method, "GET");
        assert_eq!(echo.headers.get("version").map(String::as_str), Some("one"));
    }
}
