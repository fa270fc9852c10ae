// crates/funclink-core/src/function.rs
// ============================================================================
// Module: Callables
// Description: Callable abstraction and typed registration adapters.
// Purpose: Let local closures and remote proxies share one invocation shape.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every callable implements [`Function`], which maps one JSON input value to
//! one JSON output value. Typed Rust handlers are adapted through
//! [`FunctionRegistration::typed`] and [`FunctionRegistration::composite`];
//! the adapter decodes the input with serde and reports decoding failures as
//! [`InvocationError::TypeConversion`].
//!
//! When a registration carries no explicit type metadata, descriptors are
//! discovered from the callable itself: first its own [`Signature`], then
//! the signature of the callable it wraps (one level deep).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ConversionDirection;
use crate::error::FunctionError;
use crate::error::InvocationError;
use crate::metadata::DeploymentHints;
use crate::metadata::FunctionMetadata;
use crate::metadata::SecurityPolicy;
use crate::metadata::TypeDescriptor;
use crate::pipeline::CallScope;

// ============================================================================
// SECTION: Function Trait
// ============================================================================

/// Input and output types a callable reports about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    /// Input type, when known.
    pub input: Option<TypeDescriptor>,
    /// Output type, when known.
    pub output: Option<TypeDescriptor>,
}

/// A single-input, single-output callable.
///
/// # Invariants
/// - Implementations are shared across threads and must not rely on
///   per-call interior state beyond what they synchronize themselves.
pub trait Function: Send + Sync {
    /// Invokes the callable.
    ///
    /// # Errors
    /// Returns [`InvocationError`] when the input cannot be converted, the
    /// callable fails, or a nested invocation fails.
    fn call(&self, scope: &CallScope<'_>, input: Value) -> Result<Value, InvocationError>;

    /// Returns the callable's own type signature, when known.
    fn signature(&self) -> Option<Signature> {
        None
    }

    /// Returns the callable this one wraps, when it is a wrapper.
    fn wrapped(&self) -> Option<&dyn Function> {
        None
    }
}

/// Resolves the input descriptor: metadata, then the callable's signature,
/// then the wrapped callable's signature.
#[must_use]
pub fn resolve_input_descriptor(
    metadata: &FunctionMetadata,
    function: &dyn Function,
) -> Option<TypeDescriptor> {
    metadata.input_type.clone().or_else(|| discover(function, |signature| signature.input))
}

/// Resolves the output descriptor using the same order as
/// [`resolve_input_descriptor`].
#[must_use]
pub fn resolve_output_descriptor(
    metadata: &FunctionMetadata,
    function: &dyn Function,
) -> Option<TypeDescriptor> {
    metadata.output_type.clone().or_else(|| discover(function, |signature| signature.output))
}

/// Reads one side of a signature from the callable or its direct wrappee.
fn discover(
    function: &dyn Function,
    side: fn(Signature) -> Option<TypeDescriptor>,
) -> Option<TypeDescriptor> {
    function
        .signature()
        .and_then(side)
        .or_else(|| function.wrapped().and_then(|inner| inner.signature()).and_then(side))
}

// ============================================================================
// SECTION: Adapters
// ============================================================================

/// Adapter for typed handlers.
struct TypedFunction<I, O, F> {
    /// Component key, used in conversion errors.
    component: String,
    /// Typed handler.
    handler: F,
    /// Marker for the handler's input and output types.
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O, F> TypedFunction<I, O, F>
where
    I: DeserializeOwned,
    O: Serialize,
    F: Fn(&CallScope<'_>, I) -> Result<O, InvocationError> + Send + Sync,
{
    /// Wraps a typed handler.
    const fn new(component: String, handler: F) -> Self {
        Self {
            component,
            handler,
            _types: PhantomData,
        }
    }
}

impl<I, O, F> Function for TypedFunction<I, O, F>
where
    I: DeserializeOwned,
    O: Serialize,
    F: Fn(&CallScope<'_>, I) -> Result<O, InvocationError> + Send + Sync,
{
    fn call(&self, scope: &CallScope<'_>, input: Value) -> Result<Value, InvocationError> {
        let typed: I = serde_json::from_value(input).map_err(|err| {
            InvocationError::conversion(&self.component, ConversionDirection::Input, err.to_string())
        })?;
        let output = (self.handler)(scope, typed)?;
        serde_json::to_value(output).map_err(|err| {
            InvocationError::conversion(&self.component, ConversionDirection::Output, err.to_string())
        })
    }

    fn signature(&self) -> Option<Signature> {
        Some(Signature {
            input: Some(TypeDescriptor::of::<I>()),
            output: Some(TypeDescriptor::of::<O>()),
        })
    }
}

/// Adapter for handlers that work on raw JSON values.
struct StructuralFunction<F> {
    /// Untyped handler.
    handler: F,
}

impl<F> StructuralFunction<F>
where
    F: Fn(&CallScope<'_>, Value) -> Result<Value, InvocationError> + Send + Sync,
{
    /// Wraps an untyped handler.
    const fn new(handler: F) -> Self {
        Self {
            handler,
        }
    }
}

impl<F> Function for StructuralFunction<F>
where
    F: Fn(&CallScope<'_>, Value) -> Result<Value, InvocationError> + Send + Sync,
{
    fn call(&self, scope: &CallScope<'_>, input: Value) -> Result<Value, InvocationError> {
        (self.handler)(scope, input)
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// A callable paired with the metadata it will be registered under.
pub struct FunctionRegistration {
    /// Metadata stored alongside the callable.
    metadata: FunctionMetadata,
    /// The callable.
    function: Arc<dyn Function>,
}

impl FunctionRegistration {
    /// Registers a typed handler that does not call other components.
    #[must_use]
    pub fn typed<I, O, F>(component: impl Into<String>, handler: F) -> Self
    where
        I: DeserializeOwned + 'static,
        O: Serialize + 'static,
        F: Fn(I) -> Result<O, FunctionError> + Send + Sync + 'static,
    {
        Self::composite::<I, O, _>(component, move |_scope, input| {
            handler(input).map_err(InvocationError::from)
        })
    }

    /// Registers a typed handler that may invoke other components through
    /// its [`CallScope`].
    #[must_use]
    pub fn composite<I, O, F>(component: impl Into<String>, handler: F) -> Self
    where
        I: DeserializeOwned + 'static,
        O: Serialize + 'static,
        F: Fn(&CallScope<'_>, I) -> Result<O, InvocationError> + Send + Sync + 'static,
    {
        let component = component.into();
        let metadata = FunctionMetadata::minimal(component.clone())
            .with_input_type(TypeDescriptor::of::<I>())
            .with_output_type(TypeDescriptor::of::<O>());
        Self {
            metadata,
            function: Arc::new(TypedFunction::<I, O, F>::new(component, handler)),
        }
    }

    /// Registers an untyped handler over raw JSON values.
    #[must_use]
    pub fn untyped<F>(component: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        let function = StructuralFunction::new(move |_scope: &CallScope<'_>, input: Value| {
            handler(input).map_err(InvocationError::from)
        });
        Self {
            metadata: FunctionMetadata::minimal(component),
            function: Arc::new(function),
        }
    }

    /// Registers an existing callable. Type descriptors are left for
    /// discovery from the callable's signature.
    #[must_use]
    pub fn from_function(component: impl Into<String>, function: Arc<dyn Function>) -> Self {
        Self {
            metadata: FunctionMetadata::minimal(component),
            function,
        }
    }

    /// Returns a copy with a display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = name.into();
        self
    }

    /// Returns a copy with an explicit input descriptor.
    #[must_use]
    pub fn input_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.metadata.input_type = Some(descriptor);
        self
    }

    /// Returns a copy with an explicit output descriptor.
    #[must_use]
    pub fn output_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.metadata.output_type = Some(descriptor);
        self
    }

    /// Returns a copy with a security policy.
    #[must_use]
    pub fn security(mut self, policy: SecurityPolicy) -> Self {
        self.metadata.security = Some(policy);
        self
    }

    /// Returns a copy with deployment hints.
    #[must_use]
    pub fn deployment(mut self, hints: DeploymentHints) -> Self {
        self.metadata.deployment = Some(hints);
        self
    }

    /// Returns the component key.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.metadata.component
    }

    /// Returns the metadata.
    #[must_use]
    pub const fn metadata(&self) -> &FunctionMetadata {
        &self.metadata
    }

    /// Splits the registration into metadata and callable.
    #[must_use]
    pub fn into_parts(self) -> (FunctionMetadata, Arc<dyn Function>) {
        (self.metadata, self.function)
    }
}

/// A callable found by an external discovery mechanism.
pub struct DiscoveredFunction {
    /// Component key.
    pub component: String,
    /// The callable.
    pub function: Arc<dyn Function>,
    /// Metadata, when the discovery source provided any.
    pub metadata: Option<FunctionMetadata>,
}

impl From<FunctionRegistration> for DiscoveredFunction {
    fn from(registration: FunctionRegistration) -> Self {
        let (metadata, function) = registration.into_parts();
        Self {
            component: metadata.component.clone(),
            function,
            metadata: Some(metadata),
        }
    }
}
