// crates/funclink-core/src/pipeline.rs
// ============================================================================
// Module: Call Pipeline
// Description: Resolution and interception for every component invocation.
// Purpose: Apply security, dependency, timing, and metrics stages uniformly.
// Dependencies: serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`CallPipeline`] is the only way callables are invoked. It resolves a
//! component key (local registry first, then the configured
//! [`FunctionResolver`]) and runs the call through four fixed stages:
//!
//! 1. security check against the target's policy,
//! 2. dependency recording when a calling component is known,
//! 3. timed invocation,
//! 4. metrics recording for success or failure.
//!
//! A denied call never reaches stage 3 and records no dependency edge, but
//! it is counted as a failed call. Failures are recorded and then returned
//! unchanged; panics are recorded and then resumed.
//!
//! Callables receive a [`CallScope`] whose context names them as the caller,
//! so nested invocations made through the scope record the right edge.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::panic::resume_unwind;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::context::CallContext;
use crate::dependency::DependencyAnalyzer;
use crate::error::ConversionDirection;
use crate::error::InvocationError;
use crate::error::KIND_PANIC;
use crate::function::Function;
use crate::function::resolve_input_descriptor;
use crate::metadata::FunctionMetadata;
use crate::metadata::ShapeTag;
use crate::metrics::MetricsTracker;
use crate::registry::FunctionRegistry;
use crate::security::DEFAULT_ADMIN_ROLE;
use crate::security::SecurityGate;
use crate::surface::Discovery;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Where a resolved callable runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Registered in the local registry.
    Local,
    /// Proxied to a remote endpoint.
    Remote,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// A callable ready to be invoked.
#[derive(Clone)]
pub struct ResolvedFunction {
    /// The callable.
    pub function: Arc<dyn Function>,
    /// Metadata describing the callable.
    pub metadata: Arc<FunctionMetadata>,
    /// Where the callable runs.
    pub origin: Origin,
}

/// Fallback resolution for component keys missing from the local registry.
pub trait FunctionResolver: Send + Sync {
    /// Returns a callable for the component key, if one can be produced.
    fn resolve(&self, component: &str) -> Option<ResolvedFunction>;

    /// Returns the component keys this resolver knows about.
    fn components(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Security settings applied by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Allow calls that carry no caller identity.
    pub allow_unauthenticated_internal_calls: bool,
    /// Role that bypasses group and role checks.
    pub admin_role: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            allow_unauthenticated_internal_calls: true,
            admin_role: DEFAULT_ADMIN_ROLE.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Invocation pipeline shared by every caller.
///
/// # Invariants
/// - Local registrations take precedence over the resolver.
/// - Every invocation that passes resolution records exactly one metrics
///   outcome.
pub struct CallPipeline {
    /// Local callables.
    registry: Arc<FunctionRegistry>,
    /// Fallback for keys missing locally.
    resolver: Option<Arc<dyn FunctionResolver>>,
    /// Caller/callee graph.
    dependencies: Arc<DependencyAnalyzer>,
    /// Per-component counters.
    metrics: Arc<MetricsTracker>,
    /// Access check.
    gate: SecurityGate,
}

impl CallPipeline {
    /// Creates a pipeline over a registry with fresh analytics and default
    /// settings.
    #[must_use]
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            resolver: None,
            dependencies: Arc::new(DependencyAnalyzer::new()),
            metrics: Arc::new(MetricsTracker::new()),
            gate: SecurityGate::default(),
        }
    }

    /// Returns a copy that falls back to `resolver` for unknown keys.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn FunctionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Returns a copy that records edges into a shared analyzer.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Arc<DependencyAnalyzer>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Returns a copy that records outcomes into a shared tracker.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsTracker>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns a copy with the given security settings.
    #[must_use]
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.gate =
            SecurityGate::new(settings.allow_unauthenticated_internal_calls, settings.admin_role);
        self
    }

    /// Returns the local registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// Returns the dependency analyzer.
    #[must_use]
    pub const fn dependencies(&self) -> &Arc<DependencyAnalyzer> {
        &self.dependencies
    }

    /// Returns the metrics tracker.
    #[must_use]
    pub const fn metrics(&self) -> &Arc<MetricsTracker> {
        &self.metrics
    }

    /// Returns true when a fallback resolver is configured.
    #[must_use]
    pub const fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Returns component keys known to the fallback resolver.
    #[must_use]
    pub fn remote_components(&self) -> BTreeSet<String> {
        self.resolver.as_ref().map(|resolver| resolver.components()).unwrap_or_default()
    }

    /// Returns a read-only discovery view over this pipeline.
    #[must_use]
    pub const fn discovery(&self) -> Discovery<'_> {
        Discovery::new(self)
    }

    /// Returns a scope bound to this pipeline, for invoking callables
    /// directly.
    #[must_use]
    pub const fn scope(&self, context: CallContext) -> CallScope<'_> {
        CallScope {
            pipeline: self,
            context,
        }
    }

    /// Resolves a component key without invoking it.
    ///
    /// # Errors
    /// Returns [`InvocationError::LookupMiss`] when neither the registry nor
    /// the resolver knows the key.
    pub fn resolve(&self, component: &str) -> Result<ResolvedFunction, InvocationError> {
        if let Some(entry) = self.registry.lookup(component) {
            return Ok(ResolvedFunction {
                function: entry.function,
                metadata: entry.metadata,
                origin: Origin::Local,
            });
        }
        if let Some(resolved) =
            self.resolver.as_ref().and_then(|resolver| resolver.resolve(component))
        {
            return Ok(resolved);
        }
        debug!(component, "function not found");
        Err(InvocationError::lookup_miss(component))
    }

    /// Invokes a component with a JSON input.
    ///
    /// # Errors
    /// Returns [`InvocationError`] on lookup miss, access denial, conversion
    /// failure, remote failure, or a failure raised by the callable.
    pub fn invoke(
        &self,
        context: &CallContext,
        component: &str,
        input: Value,
    ) -> Result<Value, InvocationError> {
        let resolved = self.resolve(component)?;
        self.intercept(context, &resolved, input)
    }

    /// Invokes a component with typed input and output.
    ///
    /// # Errors
    /// Returns [`InvocationError::TypeConversion`] when the input cannot be
    /// encoded or the output cannot be decoded, plus every error
    /// [`CallPipeline::invoke`] returns. An encoding failure is recorded as a
    /// failed call; a decoding failure happens after the callable succeeded
    /// and leaves its success record in place.
    pub fn invoke_typed<I, O>(
        &self,
        context: &CallContext,
        component: &str,
        input: &I,
    ) -> Result<O, InvocationError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let resolved = self.resolve(component)?;
        let value = match serde_json::to_value(input) {
            Ok(value) => value,
            Err(err) => {
                let err = InvocationError::conversion(
                    component,
                    ConversionDirection::Input,
                    err.to_string(),
                );
                self.metrics.record_failure(&resolved.metadata.component, 0, err.kind());
                return Err(err);
            }
        };
        let output = self.intercept(context, &resolved, value)?;
        serde_json::from_value(output).map_err(|err| {
            InvocationError::conversion(component, ConversionDirection::Output, err.to_string())
        })
    }

    /// Runs the four interception stages for a resolved callable.
    fn intercept(
        &self,
        context: &CallContext,
        resolved: &ResolvedFunction,
        input: Value,
    ) -> Result<Value, InvocationError> {
        let component = resolved.metadata.component.as_str();
        let entered = Instant::now();

        if let Err(err) =
            self.gate.check(component, resolved.metadata.security.as_ref(), context.security())
        {
            self.metrics.record_failure(component, millis(entered.elapsed()), err.kind());
            return Err(err);
        }

        if let Some(caller) = context.caller().filter(|caller| *caller != component) {
            self.dependencies.record_call(caller, component);
        }

        let scope = self.scope(context.enter(component));
        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            check_input_shape(resolved, &input)?;
            resolved.function.call(&scope, input)
        }));
        let duration_ms = millis(started.elapsed());

        match outcome {
            Ok(Ok(output)) => {
                self.metrics.record_success(component, duration_ms);
                debug!(component, origin = %resolved.origin, duration_ms, "invocation succeeded");
                Ok(output)
            }
            Ok(Err(err)) => {
                self.metrics.record_failure(component, duration_ms, err.kind());
                warn!(
                    component,
                    origin = %resolved.origin,
                    duration_ms,
                    kind = err.kind(),
                    trace_id = context.trace_id().unwrap_or("-"),
                    error = %err,
                    "invocation failed"
                );
                Err(err)
            }
            Err(payload) => {
                self.metrics.record_failure(component, duration_ms, KIND_PANIC);
                error!(component, duration_ms, "callable panicked");
                resume_unwind(payload)
            }
        }
    }
}

/// Rejects inputs whose JSON shape contradicts the declared input type.
fn check_input_shape(resolved: &ResolvedFunction, input: &Value) -> Result<(), InvocationError> {
    let Some(descriptor) = resolve_input_descriptor(&resolved.metadata, resolved.function.as_ref())
    else {
        return Ok(());
    };
    if descriptor.shape.accepts(input) {
        return Ok(());
    }
    Err(InvocationError::conversion(
        resolved.metadata.component.as_str(),
        ConversionDirection::Input,
        format!(
            "expected {} ({}) but received {}",
            descriptor.name,
            descriptor.shape,
            ShapeTag::of(input)
        ),
    ))
}

/// Converts a duration to whole milliseconds, saturating.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Call Scope
// ============================================================================

/// Handle given to a running callable for nested invocations.
///
/// # Invariants
/// - `context.caller()` names the component that owns this scope.
pub struct CallScope<'a> {
    /// Pipeline nested calls are routed through.
    pipeline: &'a CallPipeline,
    /// Context for calls issued from this scope.
    context: CallContext,
}

impl<'a> CallScope<'a> {
    /// Returns the context nested calls will carry.
    #[must_use]
    pub const fn context(&self) -> &CallContext {
        &self.context
    }

    /// Returns the pipeline this scope routes through.
    #[must_use]
    pub const fn pipeline(&self) -> &'a CallPipeline {
        self.pipeline
    }

    /// Invokes another component from inside a callable.
    ///
    /// # Errors
    /// Returns every error [`CallPipeline::invoke`] returns.
    pub fn invoke(&self, component: &str, input: Value) -> Result<Value, InvocationError> {
        self.pipeline.invoke(&self.context, component, input)
    }

    /// Invokes another component with typed input and output.
    ///
    /// # Errors
    /// Returns every error [`CallPipeline::invoke_typed`] returns.
    pub fn invoke_typed<I, O>(&self, component: &str, input: &I) -> Result<O, InvocationError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.pipeline.invoke_typed(&self.context, component, input)
    }
}
