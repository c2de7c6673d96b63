//! The matching-across-routes conformance test against a live gateway.

use gateway_router::config::PrecedencePolicy;
use gateway_router::conformance::{httproute_matching_across_routes, run_conformance_test, Timing};

mod common;

async fn run_with(policy: PrecedencePolicy) {
    let test = httproute_matching_across_routes();
    let backends = common::start_backends_for(&test).await;

    let mut config = test.gateway_config(&backends);
    config.matching.precedence = policy;
    let gateway = common::TestGateway::start(config).await;

    let report = run_conformance_test(&test, gateway.addr, &gateway.admin, &Timing::local())
        .await
        .unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert!(failures.is_empty(), "{:?}: {:?}", policy, failures);
    assert_eq!(report.cases.len(), 8);
    assert_eq!(report.generation, 1);
}

#[tokio::test]
async fn test_matching_across_routes_headers_first() {
    run_with(PrecedencePolicy::HeadersFirst).await;
}

#[tokio::test]
async fn test_matching_across_routes_path_first() {
    run_with(PrecedencePolicy::PathFirst).await;
}

#[tokio::test]
async fn test_readiness_times_out_for_unknown_route() {
    let mut test = httproute_matching_across_routes();
    let backends = common::start_backends_for(&test).await;
    let gateway = common::TestGateway::start(test.gateway_config(&backends)).await;

    test.routes[1].name = "matching-part3".into();
    let timing = Timing {
        ready_timeout: std::time::Duration::from_millis(300),
        ..Timing::local()
    };

    let err = run_conformance_test(&test, gateway.addr, &gateway.admin, &timing)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("matching-part3"), "{}", err);
}
