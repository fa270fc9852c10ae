// system-tests/tests/suites/stress.rs
// ============================================================================
// Module: Stress Tests
// Description: Concurrent invocations against shared pipeline state.
// Purpose: Validate exact metrics and graph state under parallel callers.
// Dependencies: system-tests helpers
// ============================================================================

//! ## Overview
//! Concurrent invocations against shared pipeline state.
//! Invariants:
//! - N successful concurrent calls yield exactly N recorded successes.
//! - Recorded durations stay within the reported min and max.

use std::error::Error;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

use funclink_core::CallContext;
use funclink_core::FunctionRegistration;
use funclink_core::PipelineSettings;
use serde_json::Value;
use serde_json::json;

use crate::helpers;
use helpers::harness::pipeline;
use helpers::stub::StubEndpoint;
use helpers::timeouts::system_config;

type TestResult = Result<(), Box<dyn Error>>;

/// Calls issued by each worker.
const CALLS_PER_WORKER: u64 = 25;

#[test]
fn concurrent_local_calls_produce_exact_metrics() -> TestResult {
    let workers = system_config().concurrency_or_default();
    let pipeline = Arc::new(pipeline(&[], PipelineSettings::default()));
    pipeline.registry().register_function(FunctionRegistration::untyped(
        "tick",
        |input: Value| {
            thread::sleep(Duration::from_millis(1));
            Ok(input)
        },
    ));
    let barrier = Arc::new(Barrier::new(workers));

    let handles: Vec<_> = (0 .. workers)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for call in 0 .. CALLS_PER_WORKER {
                    pipeline.invoke(&CallContext::internal(), "tick", json!(call)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().map_err(|_| "worker panicked")?;
    }

    let expected = u64::try_from(workers)? * CALLS_PER_WORKER;
    let metrics = pipeline.metrics().metrics_of("tick").ok_or("no metrics")?;
    assert_eq!(metrics.total_calls, expected);
    assert_eq!(metrics.successful_calls, expected);
    assert_eq!(metrics.failed_calls, 0);
    assert!(metrics.min_duration_ms <= metrics.max_duration_ms);
    assert!(metrics.total_duration_ms >= metrics.min_duration_ms * expected);
    assert!(metrics.total_duration_ms <= metrics.max_duration_ms * expected);
    Ok(())
}

#[test]
fn concurrent_nested_calls_share_one_edge() -> TestResult {
    let workers = system_config().concurrency_or_default();
    let pipeline = Arc::new(pipeline(&[], PipelineSettings::default()));
    pipeline.registry().register_function(FunctionRegistration::untyped("leaf", Ok));
    pipeline.registry().register_function(FunctionRegistration::composite(
        "parent",
        |scope, input: Value| scope.invoke("leaf", input),
    ));

    let handles: Vec<_> = (0 .. workers)
        .map(|worker| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                pipeline.invoke(&CallContext::internal(), "parent", json!(worker)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().map_err(|_| "worker panicked")?;
    }

    let graph = pipeline.dependencies().dependency_graph();
    assert_eq!(graph.get("parent").map(std::collections::BTreeSet::len), Some(1));
    let expected = u64::try_from(workers)?;
    assert_eq!(pipeline.metrics().metrics_of("leaf").ok_or("no metrics")?.total_calls, expected);
    assert_eq!(pipeline.metrics().metrics_of("parent").ok_or("no metrics")?.total_calls, expected);
    Ok(())
}

#[test]
fn concurrent_remote_calls_post_once_each() -> TestResult {
    let workers = system_config().concurrency_or_default().min(8);
    let stub = StubEndpoint::scripted(Arc::new(|body: &str| (200, body.to_string())));
    let pipeline =
        Arc::new(pipeline(&[("remoteEcho", stub.url.as_str())], PipelineSettings::default()));

    let handles: Vec<_> = (0 .. workers)
        .map(|worker| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                pipeline.invoke(&CallContext::internal(), "remoteEcho", json!({"worker": worker}))
            })
        })
        .collect();
    for (worker, handle) in handles.into_iter().enumerate() {
        let output = handle.join().map_err(|_| "worker panicked")??;
        assert_eq!(output, json!({"worker": worker}));
    }

    assert_eq!(stub.request_count(), workers);
    let metrics = pipeline.metrics().metrics_of("remoteEcho").ok_or("no metrics")?;
    assert_eq!(metrics.successful_calls, u64::try_from(workers)?);
    Ok(())
}
