// crates/funclink-remote/src/lib.rs
// ============================================================================
// Module: Funclink Remote
// Description: Remote endpoint configuration and HTTP proxy callables.
// Purpose: Resolve component keys missing locally into remote invocations.
// Dependencies: funclink-core, reqwest, url, dashmap
// ============================================================================

//! ## Overview
//! This crate maps component keys to remote URLs and synthesizes callables
//! that fulfil a call with one JSON `POST`. [`RemoteProxyResolver`] plugs into
//! [`funclink_core::CallPipeline`] as its fallback resolver, so proxied calls
//! run through the same security, dependency, and metrics stages as local
//! calls.
//! Invariants:
//! - Endpoint keys are matched case-insensitively.
//! - Each invocation of a proxied component performs exactly one request.
//! - Caller identity is never forwarded to the remote endpoint.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod endpoints;
pub mod proxy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use endpoints::DEFAULT_ENV_PREFIX;
pub use endpoints::EndpointError;
pub use endpoints::RemoteEndpoint;
pub use endpoints::RemoteEndpoints;
pub use proxy::ProxyError;
pub use proxy::RemoteFunction;
pub use proxy::RemoteProxyConfig;
pub use proxy::RemoteProxyResolver;
