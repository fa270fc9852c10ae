// system-tests/tests/suites/security.rs
// ============================================================================
// Module: Security Tests
// Description: Access policy enforcement across the pipeline.
// Purpose: Validate admin bypass, role and group denial, and fail-closed mode.
// Dependencies: system-tests helpers
// ============================================================================

//! ## Overview
//! Access policy enforcement across the pipeline.
//! Invariants:
//! - Denied calls never reach the callable and are counted as failures.
//! - Denied calls record no dependency edge.
//! - Caller identity is never forwarded to remote endpoints.

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use funclink_core::CallContext;
use funclink_core::FunctionRegistration;
use funclink_core::PipelineSettings;
use funclink_core::SecurityContext;
use funclink_core::SecurityPolicy;
use funclink_core::SecurityScope;
use serde_json::Value;
use serde_json::json;

use crate::helpers;
use helpers::harness::pipeline;
use helpers::stub::StubEndpoint;

type TestResult = Result<(), Box<dyn Error>>;

/// Registers `charge` behind a `PAYMENT_PROCESSOR` role and returns its hit
/// counter.
fn register_charge(pipeline: &funclink_core::CallPipeline) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    pipeline.registry().register_function(
        FunctionRegistration::untyped("charge", move |input: Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(input)
        })
        .security(SecurityPolicy::new().with_roles(["PAYMENT_PROCESSOR"])),
    );
    hits
}

#[test]
fn admin_role_bypasses_role_requirement() -> TestResult {
    let pipeline = pipeline(&[], PipelineSettings::default());
    let hits = register_charge(&pipeline);
    let admin = CallContext::authenticated(SecurityContext::new("ops", ["ADMIN"], None));

    let output = pipeline.invoke(&admin, "charge", json!({"amount": 5}))?;

    assert_eq!(output, json!({"amount": 5}));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn caller_without_matching_role_is_denied_and_counted() -> TestResult {
    let pipeline = pipeline(&[], PipelineSettings::default());
    let hits = register_charge(&pipeline);
    let clerk = CallContext::authenticated(SecurityContext::new("clerk", ["VIEWER"], None));

    let err = pipeline.invoke(&clerk, "charge", json!({})).unwrap_err();

    assert_eq!(err.kind(), "access_denied");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    let metrics = pipeline.metrics().metrics_of("charge").ok_or("no metrics")?;
    assert_eq!(metrics.failed_calls, 1);
    assert_eq!(metrics.error_counts.get("access_denied"), Some(&1));
    Ok(())
}

#[test]
fn denied_nested_call_records_no_edge() -> TestResult {
    let pipeline = pipeline(&[], PipelineSettings::default());
    register_charge(&pipeline);
    pipeline.registry().register_function(FunctionRegistration::composite(
        "checkout",
        |scope, input: Value| scope.invoke("charge", input),
    ));
    let clerk = CallContext::authenticated(SecurityContext::new("clerk", ["VIEWER"], None));

    let err = pipeline.invoke(&clerk, "checkout", json!({})).unwrap_err();

    assert_eq!(err.kind(), "access_denied");
    assert!(pipeline.dependencies().dependencies_of("checkout").is_empty());
    assert_eq!(pipeline.metrics().metrics_of("checkout").ok_or("no metrics")?.failed_calls, 1);
    Ok(())
}

#[test]
fn security_group_is_enforced() -> TestResult {
    let pipeline = pipeline(&[], PipelineSettings::default());
    pipeline.registry().register_function(
        FunctionRegistration::untyped("ledger", Ok)
            .security(SecurityPolicy::new().with_group("finance")),
    );
    let outsider =
        CallContext::authenticated(SecurityContext::new("eve", ["USER"], Some("sales".into())));
    let insider =
        CallContext::authenticated(SecurityContext::new("ann", ["USER"], Some("finance".into())));

    assert_eq!(pipeline.invoke(&outsider, "ledger", json!(1)).unwrap_err().kind(), "access_denied");
    assert_eq!(pipeline.invoke(&insider, "ledger", json!(1))?, json!(1));
    Ok(())
}

#[test]
fn unauthenticated_calls_fail_closed_when_disabled() -> TestResult {
    let pipeline = pipeline(
        &[],
        PipelineSettings {
            allow_unauthenticated_internal_calls: false,
            ..PipelineSettings::default()
        },
    );
    let hits = register_charge(&pipeline);

    let err = pipeline.invoke(&CallContext::internal(), "charge", json!({})).unwrap_err();
    assert_eq!(err.kind(), "access_denied");
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    pipeline.registry().register_function(FunctionRegistration::untyped("open", Ok));
    assert_eq!(pipeline.invoke(&CallContext::internal(), "open", json!(2))?, json!(2));
    Ok(())
}

#[test]
fn inbound_scope_supplies_caller_identity() -> TestResult {
    let pipeline = pipeline(&[], PipelineSettings::default());
    register_charge(&pipeline);

    {
        let _scope = SecurityScope::enter(SecurityContext::new("bot", ["PAYMENT_PROCESSOR"], None));
        assert!(pipeline.invoke(&CallContext::inbound(), "charge", json!({})).is_ok());
    }
    let _scope = SecurityScope::enter(SecurityContext::new("bot", ["GUEST"], None));
    assert!(pipeline.invoke(&CallContext::inbound(), "charge", json!({})).is_err());
    Ok(())
}

#[test]
fn identity_is_not_forwarded_to_remote_endpoints() -> TestResult {
    let stub = StubEndpoint::fixed(200, "{}");
    let pipeline = pipeline(&[("audit", stub.url.as_str())], PipelineSettings::default());
    let caller = CallContext::authenticated(SecurityContext::new(
        "alice",
        ["ADMIN"],
        Some("finance".to_string()),
    ));

    pipeline.invoke(&caller, "audit", json!({"event": "login"}))?;

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].body.contains("alice"));
    assert!(!requests[0].body.contains("finance"));
    Ok(())
}
