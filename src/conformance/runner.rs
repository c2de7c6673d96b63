//! Runs a conformance test against a live gateway.

use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::conformance::client::{make_request_and_expect_response, ConformanceError};
use crate::conformance::expectations::{test_name, Timing};
use crate::conformance::readiness::{routes_must_be_ready, AdminEndpoint};
use crate::conformance::suite::ConformanceTest;

/// Outcome of one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one conformance test.
#[derive(Debug, Clone, Serialize)]
pub struct ConformanceReport {
    pub test: String,
    pub generation: u64,
    pub elapsed_ms: u128,
    pub cases: Vec<CaseReport>,
}

impl ConformanceReport {
    pub fn passed(&self) -> bool {
        self.cases.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.passed)
    }
}

/// Wait for the test's routes, then run every case concurrently.
///
/// Readiness failure aborts the run; case failures are collected in the report.
pub async fn run_conformance_test(
    test: &ConformanceTest,
    gateway: SocketAddr,
    admin: &AdminEndpoint,
    timing: &Timing,
) -> Result<ConformanceReport, ConformanceError> {
    let started = Instant::now();
    let client = reqwest::Client::builder().no_proxy().build()?;

    let generation = routes_must_be_ready(&client, admin, &test.route_keys(), timing).await?;
    tracing::info!(test = test.short_name, cases = test.cases.len(), "Running conformance test");

    let timing = Arc::new(timing.clone());
    let handles: Vec<_> = test
        .cases
        .iter()
        .enumerate()
        .map(|(index, case)| {
            // Each task owns its case.
            let case = case.clone();
            let client = client.clone();
            let timing = Arc::clone(&timing);
            tokio::spawn(async move {
                let name = test_name(&case, index);
                let result = make_request_and_expect_response(&client, gateway, &case, index, &timing).await;
                (name, result)
            })
        })
        .collect();

    let mut cases = Vec::with_capacity(handles.len());
    for joined in futures_util::future::join_all(handles).await {
        let (name, result) = joined?;
        match &result {
            Ok(()) => tracing::info!(case = %name, "PASS"),
            Err(e) => tracing::warn!(case = %name, error = %e, "FAIL"),
        }
        cases.push(CaseReport {
            name,
            passed: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        });
    }

    Ok(ConformanceReport {
        test: test.short_name.to_string(),
        generation,
        elapsed_ms: started.elapsed().as_millis(),
        cases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_summary() {
        let report = ConformanceReport {
            test: "t".into(),
            generation: 1,
            elapsed_ms: 5,
            cases: vec![
                CaseReport { name: "0".into(), passed: true, error: None },
                CaseReport { name: "1".into(), passed: false, error: Some("wrong backend".into()) },
            ],
        };
        assert!(!report.passed());
        assert_eq!(report.failures().count(), 1);
    }
}
