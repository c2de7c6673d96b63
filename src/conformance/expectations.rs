//! What a conformance case sends and what it expects back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

/// A request sent through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpectedRequest {
    pub host: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ExpectedRequest {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

fn default_status() -> u16 {
    200
}

/// The backend that must answer `request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedResponse {
    pub request: ExpectedRequest,
    pub backend: String,
    pub namespace: String,
    #[serde(default = "default_status")]
    pub status: u16,
}

impl ExpectedResponse {
    pub fn new(request: ExpectedRequest, backend: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            request,
            backend: backend.into(),
            namespace: namespace.into(),
            status: default_status(),
        }
    }
}

/// Display name of case `index`.
///
/// `"3 request to example.com/example with headers should go to infra-backend-v1"`
pub fn test_name(case: &ExpectedResponse, index: usize) -> String {
    let mut name = format!("{} request to {}{}", index, case.request.host, case.request.path);
    if !case.request.headers.is_empty() {
        name.push_str(" with headers");
    }
    let _ = write!(name, " should go to {}", case.backend);
    name
}

/// Polling and consistency parameters for a conformance run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Correct answers in a row before a case passes.
    pub required_consecutive_successes: u32,
    /// How long a case may take to become consistent.
    pub max_time_to_consistency: Duration,
    /// Deadline for a single request.
    pub request_timeout: Duration,
    /// How long to wait for routes to be programmed.
    pub ready_timeout: Duration,
    pub poll_base: Duration,
    pub poll_max: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            required_consecutive_successes: 3,
            max_time_to_consistency: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            ready_timeout: Duration::from_secs(60),
            poll_base: Duration::from_millis(100),
            poll_max: Duration::from_secs(2),
        }
    }
}

impl Timing {
    /// Short deadlines for an in-process gateway.
    pub fn local() -> Self {
        Self {
            max_time_to_consistency: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
            ready_timeout: Duration::from_secs(10),
            poll_base: Duration::from_millis(20),
            poll_max: Duration::from_millis(500),
            ..Self::default()
        }
    }
}
