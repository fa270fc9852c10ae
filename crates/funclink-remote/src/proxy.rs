// crates/funclink-remote/src/proxy.rs
// ============================================================================
// Module: Remote Proxy
// Description: HTTP-backed callables and the resolver that builds them.
// Purpose: Fulfil calls to unregistered components with a bounded JSON POST.
// Dependencies: funclink-core, reqwest, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`RemoteProxyResolver`] is the pipeline's fallback for component keys that
//! are not registered locally. For a key with a configured endpoint it builds
//! a fresh [`RemoteFunction`] that:
//!
//! 1. serializes the input to JSON,
//! 2. sends `POST <url>` with `Content-Type: application/json`,
//! 3. on status 200 parses the body as JSON (checking its shape when the
//!    endpoint declares an output type),
//! 4. on any other status, transport failure, oversized body, or malformed
//!    body fails with [`RemoteInvocationError`].
//!
//! Requests carry no caller identity and are never retried. Redirects are not
//! followed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use funclink_core::CallScope;
use funclink_core::ConversionDirection;
use funclink_core::Function;
use funclink_core::FunctionMetadata;
use funclink_core::FunctionResolver;
use funclink_core::InvocationError;
use funclink_core::Origin;
use funclink_core::RemoteInvocationError;
use funclink_core::ResolvedFunction;
use funclink_core::ShapeTag;
use funclink_core::Signature;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::endpoints::RemoteEndpoint;
use crate::endpoints::RemoteEndpoints;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for remote proxy callables.
///
/// # Invariants
/// - `timeout_ms` applies to the full request lifecycle.
/// - `max_response_bytes` is a hard upper bound on response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteProxyConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for RemoteProxyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_response_bytes: 1024 * 1024,
            user_agent: "funclink/0.1".to_string(),
        }
    }
}

/// Errors raised while constructing the proxy resolver.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// HTTP client could not be built.
    #[error("http client build failed: {0}")]
    ClientBuild(String),
}

// ============================================================================
// SECTION: Remote Function
// ============================================================================

/// Callable that forwards its input to a remote endpoint.
pub struct RemoteFunction {
    /// Canonical component key used in errors.
    component: String,
    /// Endpoint the request is sent to.
    endpoint: RemoteEndpoint,
    /// Shared HTTP client.
    client: Client,
    /// Response size limit in bytes.
    max_response_bytes: usize,
}

impl RemoteFunction {
    /// Returns the endpoint this callable targets.
    #[must_use]
    pub const fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    /// Builds a failure without an HTTP status.
    fn transport(&self, detail: impl Into<String>) -> InvocationError {
        RemoteInvocationError::transport(self.component.as_str(), detail).into()
    }

    /// Checks a parsed body against the declared output shape.
    fn check_output(&self, value: &Value) -> Result<(), InvocationError> {
        let Some(descriptor) = &self.endpoint.output_type else {
            return Ok(());
        };
        if descriptor.shape.accepts(value) {
            return Ok(());
        }
        Err(InvocationError::conversion(
            self.component.as_str(),
            ConversionDirection::Output,
            format!(
                "expected {} ({}) but remote returned {}",
                descriptor.name,
                descriptor.shape,
                ShapeTag::of(value)
            ),
        ))
    }
}

impl Function for RemoteFunction {
    fn call(&self, _scope: &CallScope<'_>, input: Value) -> Result<Value, InvocationError> {
        let component = self.component.as_str();
        let body = serde_json::to_vec(&input).map_err(|err| {
            InvocationError::conversion(component, ConversionDirection::Input, err.to_string())
        })?;
        debug!(component, url = %self.endpoint.url, bytes = body.len(), "posting to remote endpoint");

        let mut response = self
            .client
            .post(self.endpoint.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|err| self.transport(describe_transport(&err)))?;
        let status = response.status();
        let bytes = match read_response_limited(&mut response, self.max_response_bytes) {
            Ok(bytes) => bytes,
            Err(detail) if status == StatusCode::OK => return Err(self.transport(detail)),
            Err(detail) => {
                return Err(RemoteInvocationError::status(component, status.as_u16(), detail).into());
            }
        };

        if status != StatusCode::OK {
            warn!(component, status = status.as_u16(), "remote endpoint returned error status");
            return Err(RemoteInvocationError::status(
                component,
                status.as_u16(),
                String::from_utf8_lossy(&bytes),
            )
            .into());
        }
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|err| self.transport(format!("malformed response body: {err}")))?;
        self.check_output(&value)?;
        Ok(value)
    }

    fn signature(&self) -> Option<Signature> {
        self.endpoint.output_type.clone().map(|output| Signature {
            input: None,
            output: Some(output),
        })
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Fallback resolver producing [`RemoteFunction`]s from an endpoint table.
///
/// # Invariants
/// - Every resolve builds a new callable; endpoint changes take effect on
///   the next call.
/// - Keys without an endpoint resolve to nothing, leaving the pipeline to
///   report a lookup miss.
pub struct RemoteProxyResolver {
    /// Endpoint table, shared with whoever configures it.
    endpoints: Arc<RemoteEndpoints>,
    /// Client shared by every proxy callable.
    client: Client,
    /// Proxy limits.
    config: RemoteProxyConfig,
}

impl RemoteProxyResolver {
    /// Creates a resolver over an endpoint table.
    ///
    /// # Errors
    /// Returns [`ProxyError`] when the HTTP client cannot be created.
    pub fn new(
        endpoints: Arc<RemoteEndpoints>,
        config: RemoteProxyConfig,
    ) -> Result<Self, ProxyError> {
        let client = build_http_client(&config)?;
        Ok(Self {
            endpoints,
            client,
            config,
        })
    }

    /// Returns the endpoint table.
    #[must_use]
    pub const fn endpoints(&self) -> &Arc<RemoteEndpoints> {
        &self.endpoints
    }

    /// Returns the proxy limits.
    #[must_use]
    pub const fn config(&self) -> &RemoteProxyConfig {
        &self.config
    }

    /// Builds a proxy callable for a component, if it has an endpoint.
    #[must_use]
    pub fn proxy_for(&self, component: &str) -> Option<RemoteFunction> {
        let endpoint = self.endpoints.get(component)?;
        let component = self
            .endpoints
            .metadata_for(component)
            .map_or_else(|| endpoint.component.clone(), |metadata| metadata.component);
        Some(RemoteFunction {
            component,
            endpoint,
            client: self.client.clone(),
            max_response_bytes: self.config.max_response_bytes,
        })
    }

    /// Returns the metadata a remote component is invoked under.
    ///
    /// Declared metadata wins; otherwise minimal metadata is built from the
    /// endpoint's registered spelling. The endpoint's output type fills in a
    /// missing output descriptor.
    fn metadata_for(&self, endpoint: &RemoteEndpoint) -> FunctionMetadata {
        let mut metadata = self
            .endpoints
            .metadata_for(&endpoint.component)
            .unwrap_or_else(|| FunctionMetadata::minimal(endpoint.component.as_str()));
        if metadata.output_type.is_none() {
            metadata.output_type.clone_from(&endpoint.output_type);
        }
        metadata
    }
}

impl FunctionResolver for RemoteProxyResolver {
    fn resolve(&self, component: &str) -> Option<ResolvedFunction> {
        let function = self.proxy_for(component)?;
        let metadata = self.metadata_for(&function.endpoint);
        debug!(
            component = %metadata.component,
            url = %function.endpoint.url,
            "resolved remote proxy"
        );
        Some(ResolvedFunction {
            function: Arc::new(function),
            metadata: Arc::new(metadata),
            origin: Origin::Remote,
        })
    }

    fn components(&self) -> BTreeSet<String> {
        self.endpoints.components()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the blocking HTTP client used by every proxy.
fn build_http_client(config: &RemoteProxyConfig) -> Result<Client, ProxyError> {
    Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(config.user_agent.clone())
        .redirect(Policy::none())
        .build()
        .map_err(|err| ProxyError::ClientBuild(err.to_string()))
}

/// Describes a transport failure for error details.
fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        format!("request failed: {err}")
    }
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(response: &mut Response, max_bytes: usize) -> Result<Vec<u8>, String> {
    let expected_len = response.content_length();
    let max_bytes_u64 =
        u64::try_from(max_bytes).map_err(|_| "response size limit exceeds u64".to_string())?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(format!("response exceeds size limit of {max_bytes} bytes"));
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle.read_to_end(&mut buf).map_err(|err| format!("failed to read response: {err}"))?;
    if buf.len() > max_bytes {
        return Err(format!("response exceeds size limit of {max_bytes} bytes"));
    }
    if let Some(expected) = expected_len {
        let expected =
            usize::try_from(expected).map_err(|_| "invalid response length".to_string())?;
        if buf.len() < expected {
            return Err("response truncated".to_string());
        }
    }
    Ok(buf)
}
