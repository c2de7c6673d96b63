//! Request-and-expect against a running gateway.

use reqwest::header::HOST;
use std::net::SocketAddr;
use std::time::Instant;
use thiserror::Error;

use crate::conformance::echo::EchoResponse;
use crate::conformance::expectations::{test_name, ExpectedResponse, Timing};
use crate::resilience::{with_timeout, Backoff};
use crate::routing::RouteKey;

/// Conformance harness failure.
#[derive(Debug, Error)]
pub enum ConformanceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{case}: not consistent after {attempts} attempts, last: {last}")]
    NotConsistent { case: String, attempts: u32, last: Mismatch },

    #[error("routes not programmed after {waited_secs}s: {}", join_keys(.missing))]
    RoutesNotReady { missing: Vec<RouteKey>, waited_secs: u64 },

    #[error("unknown conformance test '{0}'")]
    UnknownTest(String),

    #[error("case task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn join_keys(keys: &[RouteKey]) -> String {
    keys.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
}

/// Why one response did not satisfy its case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mismatch {
    #[error("expected status {expected}, got {actual}")]
    Status { expected: u16, actual: u16 },

    #[error("expected backend {expected}, got {actual}")]
    Backend { expected: String, actual: String },

    #[error("expected {field} '{expected}', backend saw '{actual}'")]
    Request {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("response is not an echo body: {0}")]
    Body(String),

    #[error("transport: {0}")]
    Transport(String),
}

/// Compare one gateway response with the case.
///
/// Non-2xx statuses only check the status; 2xx answers must come from the
/// expected backend and show the request unchanged.
pub fn check_response(case: &ExpectedResponse, status: u16, body: &[u8]) -> Result<(), Mismatch> {
    if status != case.status {
        return Err(Mismatch::Status {
            expected: case.status,
            actual: status,
        });
    }
    if !(200..300).contains(&status) {
        return Ok(());
    }

    let echo: EchoResponse = serde_json::from_slice(body).map_err(|e| Mismatch::Body(e.to_string()))?;

    if echo.backend != case.backend || echo.namespace != case.namespace {
        return Err(Mismatch::Backend {
            expected: format!("{}/{}", case.namespace, case.backend),
            actual: format!("{}/{}", echo.namespace, echo.backend),
        });
    }
    if echo.path != case.request.path {
        return Err(Mismatch::Request {
            field: "path",
            expected: case.request.path.clone(),
            actual: echo.path,
        });
    }
    if echo.host != case.request.host {
        return Err(Mismatch::Request {
            field: "host",
            expected: case.request.host.clone(),
            actual: echo.host,
        });
    }
    Ok(())
}

/// Send the case's request once and check the answer.
async fn round_trip(
    client: &reqwest::Client,
    gateway: SocketAddr,
    case: &ExpectedResponse,
    timing: &Timing,
) -> Result<(), Mismatch> {
    let mut request = client
        .get(format!("http://{}{}", gateway, case.request.path))
        .header(HOST, case.request.host.as_str());
    for (name, value) in &case.request.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let exchange = async {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok::<_, reqwest::Error>((status, body))
    };

    match with_timeout(timing.request_timeout, exchange).await {
        Ok(Ok((status, body))) => check_response(case, status, &body),
        Ok(Err(e)) => Err(Mismatch::Transport(e.to_string())),
        Err(e) => Err(Mismatch::Transport(e.to_string())),
    }
}

/// Send `case` through the gateway until it is answered correctly
/// `required_consecutive_successes` times in a row.
///
/// Fails with the last mismatch once `max_time_to_consistency` has elapsed.
pub async fn make_request_and_expect_response(
    client: &reqwest::Client,
    gateway: SocketAddr,
    case: &ExpectedResponse,
    index: usize,
    timing: &Timing,
) -> Result<(), ConformanceError> {
    let name = test_name(case, index);
    let started = Instant::now();
    let mut backoff = Backoff::new(timing.poll_base, timing.poll_max);
    let mut consecutive = 0;
    let mut attempts = 0;

    loop {
        attempts += 1;
        match round_trip(client, gateway, case, timing).await {
            Ok(()) => {
                consecutive += 1;
                if consecutive >= timing.required_consecutive_successes {
                    tracing::debug!(case = %name, attempts, "Case consistent");
                    return Ok(());
                }
                backoff.reset();
            }
            Err(mismatch) => {
                consecutive = 0;
                tracing::debug!(case = %name, attempts, mismatch = %mismatch, "Unexpected response");
                if started.elapsed() >= timing.max_time_to_consistency {
                    return Err(ConformanceError::NotConsistent {
                        case: name,
                        attempts,
                        last: mismatch,
                    });
                }
            }
        }
        tokio::time::sleep(backoff.next_delay()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::expectations::ExpectedRequest;

    fn case() -> ExpectedResponse {
        ExpectedResponse::new(ExpectedRequest::new("example.com", "/v2"), "infra-backend-v2", "infra")
    }

    fn echo(backend: &str, host: &str, path: &str) -> Vec<u8> {
        serde_json::to_vec(&EchoResponse {
            backend: backend.into(),
            namespace: "infra".into(),
            host: host.into(),
            path: path.into(),
            method: "GET".into(),
            headers: Default::default(),
        })
        .unwrap()
    }

    #[test]
    fn test_correct_backend_passes() {
        assert_eq!(check_response(&case(), 200, &echo("infra-backend-v2", "example.com", "/v2")), Ok(()));
    }

    #[test]
    fn test_wrong_backend() {
        let result = check_response(&case(), 200, &echo("infra-backend-v1", "example.com", "/v2"));
        assert!(matches!(result, Err(Mismatch::Backend { .. })));
    }

    #[test]
    fn test_rewritten_request_detected() {
        let result = check_response(&case(), 200, &echo("infra-backend-v2", "example.com", "/"));
        assert!(matches!(result, Err(Mismatch::Request { field: "path", .. })));

        let result = check_response(&case(), 200, &echo("infra-backend-v2", "example.net", "/v2"));
        assert!(matches!(result, Err(Mismatch::Request { field: "host", .. })));
    }

    #[test]
    fn test_status_checked_first() {
        assert_eq!(
            check_response(&case(), 404, b"not found"),
            Err(Mismatch::Status { expected: 200, actual: 404 })
        );

        let mut unmatched = case();
        unmatched.status = 404;
        assert_eq!(check_response(&unmatched, 404, b""), Ok(()));
    }

    #[test]
    fn test_non_echo_body() {
        assert!(matches!(check_response(&case(), 200, b"<html>"), Err(Mismatch::Body(_))));
    }
}
