// system-tests/tests/helpers/harness.rs
// ============================================================================
// Module: Pipeline Harness
// Description: Builders for pipelines and demo hosts used by scenarios.
// Purpose: Keep scenario setup short and uniform across suites.
// Dependencies: funclink-cli, funclink-config, funclink-core, funclink-remote
// ============================================================================

use std::sync::Arc;

use funclink_cli::Host;
use funclink_config::FunclinkConfig;
use funclink_core::CallPipeline;
use funclink_core::FunctionRegistry;
use funclink_core::PipelineSettings;
use funclink_remote::RemoteEndpoints;
use funclink_remote::RemoteProxyConfig;
use funclink_remote::RemoteProxyResolver;

use super::timeouts::proxy_timeout_ms;

/// Proxy limits for scenarios.
pub fn proxy_config() -> RemoteProxyConfig {
    RemoteProxyConfig {
        timeout_ms: proxy_timeout_ms(),
        ..RemoteProxyConfig::default()
    }
}

/// Endpoint table with the given `(component, url)` entries.
pub fn endpoints(entries: &[(&str, &str)]) -> RemoteEndpoints {
    let endpoints = RemoteEndpoints::new();
    for (component, url) in entries {
        endpoints.register(component, url).expect("valid stub endpoint");
    }
    endpoints
}

/// Pipeline with an empty registry and a remote resolver over `entries`.
pub fn pipeline(entries: &[(&str, &str)], settings: PipelineSettings) -> CallPipeline {
    let resolver = RemoteProxyResolver::new(Arc::new(endpoints(entries)), proxy_config())
        .expect("build remote resolver");
    CallPipeline::new(Arc::new(FunctionRegistry::new()))
        .with_resolver(Arc::new(resolver))
        .with_settings(settings)
}

/// Demo host configured from `toml`, proxying the given entries.
pub fn demo_host(toml: &str, entries: &[(&str, &str)]) -> Host {
    let mut config = FunclinkConfig::from_toml_str(toml).expect("valid scenario config");
    config.remote.load_env = false;
    config.remote.timeout_ms = proxy_timeout_ms();
    Host::with_endpoints(&config, endpoints(entries)).expect("build demo host")
}
