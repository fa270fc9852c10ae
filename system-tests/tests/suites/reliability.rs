// system-tests/tests/suites/reliability.rs
// ============================================================================
// Module: Reliability Tests
// Description: Remote failure handling across the pipeline.
// Purpose: Validate that remote failures are typed, counted, and not retried.
// Dependencies: system-tests helpers
// ============================================================================

//! ## Overview
//! Remote failure handling across the pipeline.
//! Invariants:
//! - Every failure is recorded in metrics before it is returned.
//! - The proxy never retries; one call is one request.

use std::error::Error;
use std::net::TcpListener;

use funclink_core::CallContext;
use funclink_core::InvocationError;
use funclink_core::PipelineSettings;
use funclink_core::surface::ErrorCategory;
use serde_json::json;

use crate::helpers;
use helpers::harness::demo_host;
use helpers::harness::pipeline;
use helpers::stub::StubEndpoint;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn server_error_is_remote_invocation_failure() -> TestResult {
    let stub = StubEndpoint::fixed(500, "upstream exploded");
    let pipeline = pipeline(&[("x", stub.url.as_str())], PipelineSettings::default());

    let err = pipeline.invoke(&CallContext::internal(), "x", json!({})).unwrap_err();

    let InvocationError::RemoteInvocation(remote) = &err else {
        panic!("expected remote invocation error, got {err:?}");
    };
    assert_eq!(remote.status, Some(500));
    assert_eq!(remote.detail, "upstream exploded");
    let metrics = pipeline.metrics().metrics_of("x").ok_or("no metrics")?;
    assert_eq!(metrics.failed_calls, 1);
    assert_eq!(metrics.successful_calls, 0);
    assert_eq!(stub.request_count(), 1);
    Ok(())
}

#[test]
fn failures_are_not_retried() -> TestResult {
    let stub = StubEndpoint::fixed(503, "busy");
    let pipeline = pipeline(&[("busy", stub.url.as_str())], PipelineSettings::default());

    for _ in 0 .. 4 {
        assert!(pipeline.invoke(&CallContext::internal(), "busy", json!({})).is_err());
    }

    assert_eq!(stub.request_count(), 4);
    let metrics = pipeline.metrics().metrics_of("busy").ok_or("no metrics")?;
    assert_eq!(metrics.failed_calls, 4);
    assert_eq!(metrics.error_counts.get("remote_invocation"), Some(&4));
    Ok(())
}

#[test]
fn malformed_body_is_remote_invocation_failure() -> TestResult {
    let stub = StubEndpoint::fixed(200, "<html>not json</html>");
    let pipeline = pipeline(&[("html", stub.url.as_str())], PipelineSettings::default());

    let err = pipeline.invoke(&CallContext::internal(), "html", json!({})).unwrap_err();

    assert_eq!(err.kind(), "remote_invocation");
    assert_eq!(pipeline.metrics().metrics_of("html").ok_or("no metrics")?.failed_calls, 1);
    Ok(())
}

#[test]
fn unreachable_endpoint_fails_fast_without_status() -> TestResult {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    let url = format!("http://{addr}/");
    let pipeline = pipeline(&[("gone", url.as_str())], PipelineSettings::default());

    match pipeline.invoke(&CallContext::internal(), "gone", json!({})) {
        Err(InvocationError::RemoteInvocation(remote)) => assert_eq!(remote.status, None),
        other => panic!("expected remote invocation error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn remote_failure_in_workflow_maps_to_execution_failed() -> TestResult {
    let stub = StubEndpoint::fixed(500, "inventory offline");
    let host = demo_host("", &[("inventoryChecker", stub.url.as_str())]);

    let response = host
        .invoke(
            None,
            "orderProcessor",
            json!({
                "userData": {"name": "Ana", "email": "ana@x.com", "age": 31},
                "productId": "p1",
                "quantity": 1
            }),
        )
        .unwrap_err();

    assert_eq!(response.error, ErrorCategory::ExecutionFailed);
    assert_eq!(response.kind, "remote_invocation");
    assert!(response.message.contains("inventory offline"), "{}", response.message);
    let metrics = host.pipeline().metrics();
    assert_eq!(metrics.metrics_of("orderProcessor").ok_or("no metrics")?.failed_calls, 1);
    assert_eq!(metrics.metrics_of("inventoryChecker").ok_or("no metrics")?.failed_calls, 1);
    assert!(metrics.metrics_of("paymentProcessor").is_none());
    Ok(())
}
