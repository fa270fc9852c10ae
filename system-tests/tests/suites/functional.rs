// system-tests/tests/suites/functional.rs
// ============================================================================
// Module: Functional Tests
// Description: End-to-end workflow, placement, and discovery scenarios.
// Purpose: Validate local and remote calls through the full stack.
// Dependencies: system-tests helpers
// ============================================================================

//! ## Overview
//! End-to-end workflow, placement, and discovery scenarios.
//! Invariants:
//! - Registered functions are served locally; unregistered keys with an
//!   endpoint are proxied with one POST per call.
//! - Each nested call records one dependency edge.

use std::error::Error;
use std::sync::Arc;

use funclink_core::CallContext;
use funclink_core::FunctionMetadata;
use funclink_core::FunctionRegistration;
use funclink_core::Origin;
use funclink_core::PipelineSettings;
use funclink_core::SecurityPolicy;
use serde_json::Value;
use serde_json::json;

use crate::helpers;
use helpers::harness::demo_host;
use helpers::harness::pipeline;
use helpers::stub::StubEndpoint;

type TestResult = Result<(), Box<dyn Error>>;

/// Registers a composite that forwards its input to `callee`.
fn register_forwarder(pipeline: &funclink_core::CallPipeline, caller: &str, callee: &str) {
    let callee = callee.to_string();
    pipeline.registry().register_function(FunctionRegistration::composite(
        caller,
        move |scope, input: Value| scope.invoke(&callee, input),
    ));
}

// ============================================================================
// SECTION: Local Workflow
// ============================================================================

#[test]
fn user_validator_accepts_adults_and_rejects_minors() -> TestResult {
    let host = demo_host("", &[]);

    let adult = host
        .invoke(None, "userValidator", json!({"name": "John", "email": "john@x.com", "age": 25}))
        .map_err(|response| response.message)?;
    assert_eq!(adult["valid"], json!(true));

    let minor = host
        .invoke(None, "userValidator", json!({"name": "John", "email": "john@x.com", "age": 17}))
        .map_err(|response| response.message)?;
    assert_eq!(minor["valid"], json!(false));

    let metrics = host.pipeline().metrics().metrics_of("userValidator").ok_or("no metrics")?;
    assert_eq!(metrics.total_calls, 2);
    assert_eq!(metrics.successful_calls, 2);
    Ok(())
}

#[test]
fn order_workflow_builds_call_graph() -> TestResult {
    let host = demo_host("", &[]);
    let output = host
        .invoke(
            None,
            "orderProcessor",
            json!({
                "userData": {"name": "Ana", "email": "ana@x.com", "age": 31},
                "productId": "p9",
                "quantity": 4,
                "paymentMethod": "CARD"
            }),
        )
        .map_err(|response| response.message)?;
    assert_eq!(output["success"], json!(true));

    let report = host.discovery().dependencies();
    assert_eq!(report.root_functions.iter().collect::<Vec<_>>(), vec!["orderProcessor"]);
    assert_eq!(report.leaf_functions.len(), 3);
    assert!(report.cycles.is_empty());
    assert!(report.dot_graph.contains("\"orderProcessor\" -> \"paymentProcessor\";"));

    let summary = host.discovery().metrics().summary;
    assert_eq!(summary.total_calls, 4);
    assert_eq!(summary.functions_with_metrics, 4);
    Ok(())
}

// ============================================================================
// SECTION: Remote Placement
// ============================================================================

#[test]
fn remote_inventory_returns_exact_structure() -> TestResult {
    let stub = StubEndpoint::fixed(200, r#"{"available":true,"availableQuantity":50}"#);
    let pipeline =
        pipeline(&[("inventoryChecker", stub.url.as_str())], PipelineSettings::default());
    register_forwarder(&pipeline, "stockLookup", "inventoryChecker");

    let output = pipeline.invoke(
        &CallContext::internal(),
        "stockLookup",
        json!({"productId": "p1", "quantity": 50}),
    )?;

    assert_eq!(output, json!({"available": true, "availableQuantity": 50}));
    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/functions/invoke");
    let sent: Value = serde_json::from_str(&requests[0].body)?;
    assert_eq!(sent, json!({"productId": "p1", "quantity": 50}));

    let graph = pipeline.dependencies().dependency_graph();
    let edges: usize = graph.values().map(std::collections::BTreeSet::len).sum();
    assert_eq!(edges, 1);
    assert!(pipeline.dependencies().dependents_of("inventoryChecker").contains("stockLookup"));
    let metrics = pipeline.metrics().metrics_of("inventoryChecker").ok_or("no metrics")?;
    assert_eq!(metrics.successful_calls, 1);
    assert_eq!(metrics.total_calls, 1);
    assert!(!pipeline.registry().is_registered("inventoryChecker"));
    Ok(())
}

#[test]
fn each_remote_call_is_one_post() -> TestResult {
    let stub = StubEndpoint::scripted(Arc::new(|body: &str| (200, body.to_string())));
    let pipeline = pipeline(&[("echo", stub.url.as_str())], PipelineSettings::default());

    for round in 0 .. 3 {
        let output = pipeline.invoke(&CallContext::internal(), "echo", json!({"round": round}))?;
        assert_eq!(output, json!({"round": round}));
    }

    assert_eq!(stub.request_count(), 3);
    assert!(pipeline.registry().is_empty());
    assert_eq!(pipeline.metrics().metrics_of("echo").ok_or("no metrics")?.successful_calls, 3);
    Ok(())
}

#[test]
fn demo_host_proxies_configured_components() -> TestResult {
    let stub = StubEndpoint::fixed(
        200,
        r#"{"success":true,"transactionId":"remote-1","message":"ok","status":"COMPLETED"}"#,
    );
    let host = demo_host("", &[("paymentProcessor", stub.url.as_str())]);
    assert_eq!(host.pipeline().resolve("paymentProcessor")?.origin, Origin::Remote);

    let output = host
        .invoke(
            None,
            "orderProcessor",
            json!({
                "userData": {"name": "Ana", "email": "ana@x.com", "age": 31},
                "productId": "p9",
                "quantity": 2
            }),
        )
        .map_err(|response| response.message)?;

    assert_eq!(output["transactionId"], json!("remote-1"));
    let sent: Value = serde_json::from_str(&stub.requests()[0].body)?;
    assert_eq!(sent["amount"], json!(20.0));
    assert_eq!(sent["paymentMethod"], json!("CARD"));
    assert_eq!(sent["userId"], json!("Ana"));
    Ok(())
}

// ============================================================================
// SECTION: Registry and Graph
// ============================================================================

#[test]
fn lookup_returns_registered_metadata_until_replaced() -> TestResult {
    let pipeline = pipeline(&[], PipelineSettings::default());
    let registry = pipeline.registry();
    let metadata = FunctionMetadata::new("Quote", "quote")
        .with_security(SecurityPolicy::new().with_group("sales"));
    let (_, function) = FunctionRegistration::untyped("quote", |_input| Ok(json!(1))).into_parts();
    registry.register("quote", function, Some(metadata.clone()));

    let entry = registry.lookup("quote").ok_or("quote missing")?;
    assert_eq!(entry.metadata.as_ref(), &metadata);
    assert_eq!(pipeline.invoke(&CallContext::internal(), "quote", json!({}))?, json!(1));

    registry.register_function(FunctionRegistration::untyped("quote", |_input| Ok(json!(2))));
    assert_eq!(pipeline.invoke(&CallContext::internal(), "quote", json!({}))?, json!(2));
    assert_eq!(registry.lookup("quote").ok_or("quote missing")?.metadata.name, "quote");

    registry.clear();
    assert!(registry.lookup("quote").is_none());
    Ok(())
}

#[test]
fn call_cycle_is_reported_in_call_order() -> TestResult {
    let pipeline = pipeline(&[], PipelineSettings::default());
    for (caller, callee) in [("A", "B"), ("B", "C"), ("C", "A")] {
        let callee = callee.to_string();
        pipeline.registry().register_function(FunctionRegistration::composite(
            caller,
            move |scope, hops: u32| {
                if hops == 0 {
                    Ok(0)
                } else {
                    scope.invoke_typed::<u32, u32>(&callee, &(hops - 1))
                }
            },
        ));
    }

    pipeline.invoke(&CallContext::internal(), "A", json!(3))?;

    let cycles = pipeline.dependencies().find_cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0], vec!["A", "B", "C", "A"]);
    let report = pipeline.discovery().dependencies();
    assert!(report.leaf_functions.is_empty());
    assert!(report.root_functions.is_empty());
    Ok(())
}

#[test]
fn isolated_components_are_neither_leaf_nor_root() -> TestResult {
    let pipeline = pipeline(&[], PipelineSettings::default());
    pipeline.registry().register_function(FunctionRegistration::untyped("solo", Ok));
    pipeline.invoke(&CallContext::internal(), "solo", json!(true))?;

    let report = pipeline.discovery().dependencies();
    assert!(!report.leaf_functions.contains("solo"));
    assert!(!report.root_functions.contains("solo"));
    Ok(())
}
