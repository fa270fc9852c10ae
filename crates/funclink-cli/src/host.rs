// crates/funclink-cli/src/host.rs
// ============================================================================
// Module: Demo Host
// Description: Pipeline assembly from runtime configuration.
// Purpose: Register the demo locally and proxy configured keys remotely.
// Dependencies: funclink-config, funclink-core, funclink-remote, thiserror
// ============================================================================

//! ## Overview
//! [`Host`] owns one [`CallPipeline`] built from a [`FunclinkConfig`]. Every
//! demo callable gets its `[functions.<component>]` overrides applied. Those
//! whose keys have a remote endpoint are left unregistered so the resolver
//! proxies them, and their metadata is handed to the endpoint table so the
//! proxy is checked against the same policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use funclink_config::ConfigError;
use funclink_config::FunclinkConfig;
use funclink_core::CallContext;
use funclink_core::CallPipeline;
use funclink_core::Discovery;
use funclink_core::ErrorResponse;
use funclink_core::FunctionRegistry;
use funclink_core::SecurityContext;
use funclink_core::TraceIdGenerator;
use funclink_remote::ProxyError;
use funclink_remote::RemoteEndpoints;
use funclink_remote::RemoteProxyResolver;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::demo;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures while assembling a [`Host`].
#[derive(Debug, Error)]
pub enum HostError {
    /// Configuration could not be turned into endpoints.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The remote proxy client could not be built.
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

// ============================================================================
// SECTION: Host
// ============================================================================

/// Demo workflow wired onto a configured pipeline.
///
/// # Invariants
/// - A demo key is either registered locally or has a remote endpoint, never
///   both.
pub struct Host {
    /// Pipeline every invocation goes through.
    pipeline: CallPipeline,
    /// Endpoint table shared with the resolver.
    endpoints: Arc<RemoteEndpoints>,
    /// Trace identifiers for error correlation.
    traces: TraceIdGenerator,
}

impl Host {
    /// Builds a host using the configured endpoint sources.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when an endpoint is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &FunclinkConfig) -> Result<Self, HostError> {
        let endpoints = config.remote_endpoints()?;
        Self::with_endpoints(config, endpoints)
    }

    /// Builds a host over an explicit endpoint table.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Proxy`] when the HTTP client cannot be built.
    pub fn with_endpoints(
        config: &FunclinkConfig,
        endpoints: RemoteEndpoints,
    ) -> Result<Self, HostError> {
        let registry = Arc::new(FunctionRegistry::new());
        for registration in demo::registrations() {
            let registration = config.apply_function_overrides(registration);
            if endpoints.contains(registration.component()) {
                info!(component = registration.component(), "serving component remotely");
                endpoints.describe(registration.metadata().clone());
                continue;
            }
            registry.register_function(registration);
        }
        let endpoints = Arc::new(endpoints);
        let resolver = RemoteProxyResolver::new(Arc::clone(&endpoints), config.proxy_config())?;
        let pipeline = CallPipeline::new(registry)
            .with_resolver(Arc::new(resolver))
            .with_settings(config.pipeline_settings());
        Ok(Self {
            pipeline,
            endpoints,
            traces: TraceIdGenerator::new(),
        })
    }

    /// Returns the underlying pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &CallPipeline {
        &self.pipeline
    }

    /// Returns the read-only discovery surface.
    #[must_use]
    pub const fn discovery(&self) -> Discovery<'_> {
        self.pipeline.discovery()
    }

    /// Returns the keys served by remote endpoints.
    #[must_use]
    pub fn remote_components(&self) -> BTreeSet<String> {
        self.endpoints.components()
    }

    /// Invokes `component` as `identity`, or as an internal call when no
    /// identity is given.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorResponse`] carrying a fresh trace id when the call
    /// fails at any pipeline stage.
    pub fn invoke(
        &self,
        identity: Option<SecurityContext>,
        component: &str,
        input: Value,
    ) -> Result<Value, ErrorResponse> {
        let trace_id = self.traces.issue();
        let context = identity
            .map_or_else(CallContext::internal, CallContext::authenticated)
            .with_trace_id(trace_id.clone());
        self.pipeline
            .invoke(&context, component, input)
            .map_err(|err| ErrorResponse::from_error(&err, trace_id))
    }
}
