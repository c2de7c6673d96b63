//! Conformance tests: the routes a test installs and the cases it checks.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;

use crate::config::{
    BackendConfig, BackendRefConfig, GatewayConfig, HeaderMatchConfig, MatchConfig, PathMatchConfig,
    RouteConfig, RuleConfig,
};
use crate::conformance::expectations::{ExpectedRequest, ExpectedResponse};
use crate::routing::RouteKey;
use crate::upstream::BackendRef;

/// Namespace shared by the built-in suites.
pub const INFRA_NAMESPACE: &str = "gateway-conformance-infra";

/// One conformance test.
#[derive(Debug, Clone)]
pub struct ConformanceTest {
    pub short_name: &'static str,
    pub description: &'static str,
    pub routes: Vec<RouteConfig>,
    pub cases: Vec<ExpectedResponse>,
}

impl ConformanceTest {
    /// Routes that must be programmed before the cases run.
    pub fn route_keys(&self) -> Vec<RouteKey> {
        self.routes
            .iter()
            .map(|r| RouteKey::new(r.namespace.clone(), r.name.clone()))
            .collect()
    }

    /// Every backend referenced by the routes.
    pub fn backend_refs(&self) -> BTreeSet<BackendRef> {
        self.routes
            .iter()
            .flat_map(|route| route.rules.iter().map(|rule| rule.backend.resolve(&route.namespace)))
            .collect()
    }

    /// Gateway configuration installing this test's routes, with each backend at
    /// the given address. Other sections keep their defaults.
    pub fn gateway_config(&self, backends: &BTreeMap<BackendRef, SocketAddr>) -> GatewayConfig {
        GatewayConfig {
            routes: self.routes.clone(),
            backends: backends
                .iter()
                .map(|(reference, addr)| BackendConfig {
                    name: reference.name.clone(),
                    namespace: reference.namespace.clone(),
                    address: addr.to_string(),
                })
                .collect(),
            ..GatewayConfig::default()
        }
    }
}

/// Every built-in test.
pub fn all_tests() -> Vec<ConformanceTest> {
    vec![httproute_matching_across_routes()]
}

/// Look a built-in test up by short name.
pub fn find_test(short_name: &str) -> Option<ConformanceTest> {
    all_tests().into_iter().find(|t| t.short_name == short_name)
}

fn path_prefix(value: &str) -> MatchConfig {
    MatchConfig {
        path: Some(PathMatchConfig::prefix(value)),
        headers: vec![],
    }
}

fn header(name: &str, value: &str) -> MatchConfig {
    MatchConfig {
        path: None,
        headers: vec![HeaderMatchConfig::exact(name, value)],
    }
}

fn route(name: &str, hostnames: &[&str], matches: Vec<MatchConfig>, backend: &str) -> RouteConfig {
    RouteConfig {
        name: name.to_string(),
        namespace: INFRA_NAMESPACE.to_string(),
        hostnames: hostnames.iter().map(|h| h.to_string()).collect(),
        priority: 0,
        rules: vec![RuleConfig {
            matches,
            backend: BackendRefConfig::named(backend),
        }],
    }
}

fn expect(request: ExpectedRequest, backend: &str) -> ExpectedResponse {
    ExpectedResponse::new(request, backend, INFRA_NAMESPACE)
}

/// Two routes with path matching for different backends.
pub fn httproute_matching_across_routes() -> ConformanceTest {
    let routes = vec![
        route(
            "matching-part1",
            &["example.com", "example.net"],
            vec![path_prefix("/"), header("version", "one")],
            "infra-backend-v1",
        ),
        route(
            "matching-part2",
            &["example.com"],
            vec![path_prefix("/v2"), header("version", "two")],
            "infra-backend-v2",
        ),
    ];

    let cases = vec![
        expect(ExpectedRequest::new("example.com", "/"), "infra-backend-v1"),
        expect(ExpectedRequest::new("example.com", "/example"), "infra-backend-v1"),
        expect(ExpectedRequest::new("example.net", "/example"), "infra-backend-v1"),
        expect(
            ExpectedRequest::new("example.com", "/example").with_header("Version", "one"),
            "infra-backend-v1",
        ),
        expect(ExpectedRequest::new("example.com", "/v2"), "infra-backend-v2"),
        // v2 matches are limited to example.com
        expect(ExpectedRequest::new("example.net", "/v2"), "infra-backend-v1"),
        expect(ExpectedRequest::new("example.com", "/v2/example"), "infra-backend-v2"),
        expect(
            ExpectedRequest::new("example.com", "/").with_header("Version", "two"),
            "infra-backend-v2",
        ),
    ];

    ConformanceTest {
        short_name: "HTTPRouteMatchingAcrossRoutes",
        description: "Two HTTPRoutes with path matching for different backends",
        routes,
        cases,
    }
}
