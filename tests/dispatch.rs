//! Gateway dispatch: status mapping, header handling and the admin API.

use gateway_router::admin::{BackendStatus, RoutesStatus, SystemStatus};
use gateway_router::config::{BackendConfig, BackendRefConfig, GatewayConfig, RouteConfig, RuleConfig};
use gateway_router::conformance::EchoResponse;
use gateway_router::upstream::BackendRef;
use reqwest::header::HOST;
use std::net::SocketAddr;
use std::time::Duration;

mod common;

fn single_route(backend: SocketAddr, hostnames: &[&str]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.backends.push(BackendConfig {
        name: "echo".into(),
        namespace: "default".into(),
        address: backend.to_string(),
    });
    config.routes.push(RouteConfig {
        name: "only".into(),
        namespace: "default".into(),
        hostnames: hostnames.iter().map(|h| h.to_string()).collect(),
        priority: 0,
        rules: vec![RuleConfig {
            matches: vec![],
            backend: BackendRefConfig::named("echo"),
        }],
    });
    config
}

#[tokio::test]
async fn test_unmatched_is_404() {
    let backend = common::start_echo_backend(BackendRef::new("echo", "default")).await;
    let gateway = common::TestGateway::start(single_route(backend, &["example.com"])).await;

    let res = common::client()
        .get(gateway.url("/anything"))
        .header(HOST, "example.org")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_default_backend_catches_unmatched() {
    let backend = common::start_echo_backend(BackendRef::new("echo", "default")).await;
    let mut config = single_route(backend, &["example.com"]);
    config.matching.default_backend = Some(BackendRef::new("echo", "default"));
    let gateway = common::TestGateway::start(config).await;

    let res = common::client()
        .get(gateway.url("/x"))
        .header(HOST, "example.org")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let echo: EchoResponse = res.json().await.unwrap();
    assert_eq!(echo.backend, "echo");
}

#[tokio::test]
async fn test_request_forwarded_intact() {
    let backend = common::start_echo_backend(BackendRef::new("echo", "default")).await;
    let gateway = common::TestGateway::start(single_route(backend, &[])).await;

    let res = common::client()
        .post(gateway.url("/v2/example?q=1"))
        .header(HOST, "Example.COM:8080")
        .header("Version", "two")
        .header("Connection", "close")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));

    let echo: EchoResponse = res.json().await.unwrap();
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/v2/example");
    // The backend sees the client's Host, not its own address.
    assert_eq!(echo.host, "Example.COM:8080");
    assert_eq!(echo.headers.get("version").map(String::as_str), Some("two"));
    assert!(echo.headers.contains_key("x-request-id"));
    assert!(echo.headers.contains_key("x-forwarded-for"));
}

#[tokio::test]
async fn test_upstream_failures_map_to_gateway_errors() {
    let refused = common::closed_port().await;
    let gateway = common::TestGateway::start(single_route(refused, &[])).await;
    let res = common::client().get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 502);

    let slow = common::start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, "late".to_string())
    })
    .await;
    let mut config = single_route(slow, &[]);
    config.timeouts.request_secs = 1;
    let gateway = common::TestGateway::start(config).await;
    let res = common::client().get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 504);
}

#[tokio::test]
async fn test_upstream_status_passed_through() {
    let backend = common::start_programmable_backend(|| async { (503, "busy".to_string()) }).await;
    let gateway = common::TestGateway::start(single_route(backend, &[])).await;

    let res = common::client().get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 503);
    assert_eq!(res.text().await.unwrap(), "busy");
}

#[tokio::test]
async fn test_admin_api() {
    let backend = common::start_echo_backend(BackendRef::new("echo", "default")).await;
    let gateway = common::TestGateway::start(single_route(backend, &["example.com"])).await;
    let client = common::client();

    let status: SystemStatus = client
        .get(format!("{}/admin/status", gateway.admin.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status.generation, 1);
    assert_eq!(status.routes, 1);

    let routes = gateway.admin.routes(&client).await.unwrap();
    assert_eq!(routes.routes[0].key.to_string(), "default/only");
    assert_eq!(routes.routes[0].hostnames, vec!["example.com".to_string()]);

    let backends: Vec<BackendStatus> = client
        .get(format!("{}/admin/backends", gateway.admin.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(backends.len(), 1);
    assert_eq!(backends[0].address, backend.to_string());
    assert_eq!(backends[0].active_requests, 0);
}

#[tokio::test]
async fn test_admin_api_key() {
    let backend = common::start_echo_backend(BackendRef::new("echo", "default")).await;
    let mut config = single_route(backend, &[]);
    config.admin.api_key = Some("secret".into());
    let gateway = common::TestGateway::start(config).await;
    let client = common::client();

    let res = client
        .get(format!("{}/admin/routes", gateway.admin.url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("{}/admin/routes", gateway.admin.url))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    // AdminEndpoint carries the key from the config.
    let routes: RoutesStatus = gateway.admin.routes(&client).await.unwrap();
    assert_eq!(routes.routes.len(), 1);
}
