//! Wait until the gateway has programmed a set of routes.

use reqwest::header::AUTHORIZATION;
use std::collections::BTreeSet;
use std::time::Instant;

use crate::admin::RoutesStatus;
use crate::conformance::client::ConformanceError;
use crate::conformance::expectations::Timing;
use crate::resilience::{with_timeout, Backoff};
use crate::routing::RouteKey;

/// Where the gateway's admin API lives.
#[derive(Debug, Clone)]
pub struct AdminEndpoint {
    /// Base URL, e.g. `http://127.0.0.1:8081`.
    pub url: String,
    pub api_key: Option<String>,
}

impl AdminEndpoint {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Fetch the currently programmed routes.
    pub async fn routes(&self, client: &reqwest::Client) -> Result<RoutesStatus, reqwest::Error> {
        let mut request = client.get(format!("{}/admin/routes", self.url));
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", key));
        }
        request.send().await?.error_for_status()?.json().await
    }
}

/// Routes from `wanted` missing in `status`.
pub fn missing_routes(status: &RoutesStatus, wanted: &[RouteKey]) -> Vec<RouteKey> {
    let programmed: BTreeSet<&RouteKey> = status.routes.iter().map(|r| &r.key).collect();
    wanted
        .iter()
        .filter(|key| !programmed.contains(key))
        .cloned()
        .collect()
}

/// Poll the admin API until every route in `routes` is programmed.
///
/// Returns the generation that first contained them all. Admin errors count as
/// "not ready yet" until `ready_timeout` elapses.
pub async fn routes_must_be_ready(
    client: &reqwest::Client,
    admin: &AdminEndpoint,
    routes: &[RouteKey],
    timing: &Timing,
) -> Result<u64, ConformanceError> {
    let started = Instant::now();
    let mut backoff = Backoff::new(timing.poll_base, timing.poll_max);
    let mut missing = routes.to_vec();

    loop {
        match with_timeout(timing.request_timeout, admin.routes(client)).await {
            Ok(Ok(status)) => {
                missing = missing_routes(&status, routes);
                if missing.is_empty() {
                    tracing::info!(generation = status.generation, routes = routes.len(), "Routes programmed");
                    return Ok(status.generation);
                }
                tracing::debug!(missing = missing.len(), "Waiting for routes");
            }
            Ok(Err(e)) => tracing::debug!(error = %e, "Admin API not ready"),
            Err(e) => tracing::debug!(error = %e, "Admin API request timed out"),
        }

        if started.elapsed() >= timing.ready_timeout {
            return Err(ConformanceError::RoutesNotReady {
                missing,
                waited_secs: started.elapsed().as_secs(),
            });
        }
        tokio::time::sleep(backoff.next_delay()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::ProgrammedRoute;

    #[test]
    fn test_missing_routes() {
        let status = RoutesStatus {
            generation: 3,
            routes: vec![ProgrammedRoute {
                key: RouteKey::new("infra", "matching-part1"),
                hostnames: vec!["example.com".into()],
                rules: 1,
            }],
        };
        let wanted = [RouteKey::new("infra", "matching-part1"), RouteKey::new("infra", "matching-part2")];
        assert_eq!(missing_routes(&status, &wanted), vec![RouteKey::new("infra", "matching-part2")]);
        assert!(missing_routes(&status, &wanted[..1]).is_empty());
    }

    #[test]
    fn test_admin_url_trimmed() {
        assert_eq!(AdminEndpoint::new("http://127.0.0.1:8081/", None).url, "http://127.0.0.1:8081");
    }
}
