// crates/funclink-remote/tests/common/mod.rs
// ============================================================================
// Module: Common Remote Test Fixtures
// Description: Stub HTTP endpoints and pipeline builders for proxy tests.
// Purpose: Drive the proxy against real sockets without external services.
// Dependencies: funclink-core, funclink-remote, tiny_http
// ============================================================================

//! ## Overview
//! A one-shot `tiny_http` stub that records the request it receives and
//! answers with a canned status and body, plus helpers that wire a pipeline
//! to a [`RemoteProxyResolver`].

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use funclink_core::CallPipeline;
use funclink_core::FunctionRegistry;
use funclink_remote::RemoteEndpoints;
use funclink_remote::RemoteProxyConfig;
use funclink_remote::RemoteProxyResolver;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Stub Server
// ============================================================================

/// Request observed by a stub endpoint.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// `Content-Type` header value, if sent.
    pub content_type: Option<String>,
    /// Names of every header sent, lowercased.
    pub header_names: Vec<String>,
    /// Raw request body.
    pub body: String,
}

/// Canned answer for a stub endpoint.
#[derive(Debug, Clone)]
pub struct StubReply {
    /// Status code to send.
    pub status: u16,
    /// Body to send.
    pub body: String,
    /// Delay before answering.
    pub delay: Option<Duration>,
}

impl StubReply {
    /// Immediate reply with the given status and body.
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    /// Reply sent after `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Serves one request and returns the base URL plus a handle yielding the
/// recorded request.
pub fn stub_endpoint(reply: StubReply) -> (String, thread::JoinHandle<Option<RecordedRequest>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let url = format!("http://{addr}/invoke");
    let handle = thread::spawn(move || {
        let mut request = server.recv_timeout(Duration::from_secs(10)).ok().flatten()?;
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).ok()?;
        let recorded = RecordedRequest {
            method: request.method().to_string(),
            content_type: request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Content-Type"))
                .map(|header| header.value.as_str().to_string()),
            header_names: request
                .headers()
                .iter()
                .map(|header| header.field.as_str().as_str().to_ascii_lowercase())
                .collect(),
            body,
        };
        if let Some(delay) = reply.delay {
            thread::sleep(delay);
        }
        let response = Response::from_string(reply.body).with_status_code(reply.status);
        let _ = request.respond(response);
        Some(recorded)
    });
    (url, handle)
}

// ============================================================================
// SECTION: Pipelines
// ============================================================================

/// Builds a resolver over `endpoints` with the given limits.
pub fn resolver(endpoints: &Arc<RemoteEndpoints>, config: RemoteProxyConfig) -> RemoteProxyResolver {
    RemoteProxyResolver::new(Arc::clone(endpoints), config).unwrap()
}

/// Builds a pipeline with an empty registry that proxies `component` to
/// `url`.
pub fn remote_pipeline(component: &str, url: &str, config: RemoteProxyConfig) -> CallPipeline {
    let endpoints = Arc::new(RemoteEndpoints::new());
    endpoints.register(component, url).unwrap();
    CallPipeline::new(Arc::new(FunctionRegistry::new()))
        .with_resolver(Arc::new(resolver(&endpoints, config)))
}

/// Proxy limits with a short timeout for tests.
pub fn fast_config() -> RemoteProxyConfig {
    RemoteProxyConfig {
        timeout_ms: 5_000,
        ..RemoteProxyConfig::default()
    }
}
