// crates/funclink-cli/tests/common/mod.rs
// ============================================================================
// Module: Common Host Test Fixtures
// Description: Config builders and a one-shot stub endpoint.
// Purpose: Assemble hosts against local and remote callables.
// Dependencies: funclink-cli, funclink-config, funclink-remote, tiny_http
// ============================================================================

//! ## Overview
//! Helpers shared by the host workflow tests.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::thread;
use std::time::Duration;

use funclink_cli::Host;
use funclink_config::FunclinkConfig;
use funclink_remote::RemoteEndpoints;
use serde_json::Value;
use serde_json::json;
use tiny_http::Response;
use tiny_http::Server;

/// Serves one request with `status` and `body`; the handle yields the
/// received body.
pub fn stub_endpoint(status: u16, body: &str) -> (String, thread::JoinHandle<Option<String>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let body = body.to_string();
    let handle = thread::spawn(move || {
        let mut request = server.recv_timeout(Duration::from_secs(10)).ok().flatten()?;
        let mut received = String::new();
        request.as_reader().read_to_string(&mut received).ok()?;
        let _ = request.respond(Response::from_string(body).with_status_code(status));
        Some(received)
    });
    (format!("http://{addr}/invoke"), handle)
}

/// Config parsed from TOML with environment endpoints disabled.
pub fn config(toml: &str) -> FunclinkConfig {
    let mut config = FunclinkConfig::from_toml_str(toml).unwrap();
    config.remote.load_env = false;
    config
}

/// Host with every demo callable local.
pub fn local_host(toml: &str) -> Host {
    Host::with_endpoints(&config(toml), RemoteEndpoints::new()).unwrap()
}

/// Host whose endpoints come from the `[remote.endpoints]` table only.
pub fn configured_host(toml: &str) -> Host {
    Host::from_config(&config(toml)).unwrap()
}

/// Host with `component` proxied to `url`.
pub fn remote_host(component: &str, url: &str) -> Host {
    let endpoints = RemoteEndpoints::new();
    endpoints.register(component, url).unwrap();
    Host::with_endpoints(&config(""), endpoints).unwrap()
}

/// A valid order for `quantity` units.
pub fn order(age: u32, quantity: u32) -> Value {
    json!({
        "userData": {"name": "John", "email": "john@x.com", "age": age},
        "productId": "p1",
        "quantity": quantity,
    })
}
