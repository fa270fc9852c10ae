// crates/funclink-core/src/lib.rs
// ============================================================================
// Module: Funclink Core
// Description: Function registry, call pipeline, and runtime analytics.
// Purpose: Let components call each other by key without knowing placement.
// Dependencies: dashmap, rand, serde, serde_json, thiserror, time, tracing
// ============================================================================

//! ## Overview
//! Funclink Core lets one component invoke another by a short component key
//! without knowing whether the target lives in the same process or behind a
//! remote HTTP endpoint. Callables are stored in a [`FunctionRegistry`]; keys
//! that are not registered locally are handed to a [`FunctionResolver`]
//! (implemented by `funclink-remote`).
//!
//! Every invocation flows through the [`CallPipeline`], which runs four fixed
//! stages: security check, dependency recording, timed invoke, and metrics.
//! The pipeline feeds a [`DependencyAnalyzer`] (caller/callee graph, cycle
//! detection, DOT export) and a [`MetricsTracker`] (lock-free per-component
//! counters). Read-only discovery reports live in [`surface`].
//!
//! Invariants:
//! - A component key maps to at most one callable at any time.
//! - Failures are recorded in metrics and then returned unchanged.
//! - Denied calls never reach the target callable.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod context;
pub mod dependency;
pub mod error;
pub mod function;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod security;
pub mod surface;
pub mod time;
pub mod trace;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::CallContext;
pub use dependency::DependencyAnalyzer;
pub use dependency::DependencyInfo;
pub use error::ConversionDirection;
pub use error::FunctionError;
pub use error::InvocationError;
pub use error::RemoteInvocationError;
pub use function::DiscoveredFunction;
pub use function::Function;
pub use function::FunctionRegistration;
pub use function::Signature;
pub use metadata::DeploymentHints;
pub use metadata::FunctionMetadata;
pub use metadata::SecurityPolicy;
pub use metadata::ShapeTag;
pub use metadata::TypeDescriptor;
pub use metrics::MetricsSnapshot;
pub use metrics::MetricsSummary;
pub use metrics::MetricsTracker;
pub use pipeline::CallPipeline;
pub use pipeline::CallScope;
pub use pipeline::FunctionResolver;
pub use pipeline::Origin;
pub use pipeline::PipelineSettings;
pub use pipeline::ResolvedFunction;
pub use registry::FunctionRegistry;
pub use registry::RegistryEntry;
pub use security::SecurityContext;
pub use security::SecurityGate;
pub use security::SecurityScope;
pub use surface::Discovery;
pub use surface::ErrorResponse;
pub use trace::TraceIdGenerator;
