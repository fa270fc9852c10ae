// crates/funclink-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared callables and pipeline builders for core tests.
// Purpose: Keep integration tests focused on the behavior under test.
// Dependencies: funclink-core, serde
// ============================================================================

//! ## Overview
//! Shared fixtures: small typed payloads, callables that succeed, fail, or
//! forward to another component, and helpers that build a pipeline from a
//! list of registrations.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use funclink_core::CallPipeline;
use funclink_core::FunctionError;
use funclink_core::FunctionRegistration;
use funclink_core::FunctionRegistry;
use funclink_core::SecurityContext;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Typed input for the greeter fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    /// Name to greet.
    pub name: String,
}

/// Typed output for the greeter fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Greeting text.
    pub message: String,
}

// ============================================================================
// SECTION: Callables
// ============================================================================

/// Typed callable that greets by name.
pub fn greeter(component: &str) -> FunctionRegistration {
    FunctionRegistration::typed(component, |input: Greeting| {
        Ok(Reply {
            message: format!("hello {}", input.name),
        })
    })
}

/// Untyped callable that returns its input unchanged.
pub fn echo(component: &str) -> FunctionRegistration {
    FunctionRegistration::untyped(component, Ok)
}

/// Untyped callable that always fails with the given kind.
pub fn failing(component: &str, kind: &'static str) -> FunctionRegistration {
    FunctionRegistration::untyped(component, move |_input: Value| {
        Err(FunctionError::new(kind, "deliberate failure"))
    })
}

/// Callable that forwards its input to `target` and returns the result.
pub fn forwarding(component: &str, target: &str) -> FunctionRegistration {
    let target = target.to_string();
    FunctionRegistration::composite(component, move |scope, input: Value| {
        scope.invoke(&target, input)
    })
}

// ============================================================================
// SECTION: Pipelines
// ============================================================================

/// Builds a pipeline over a fresh registry holding the registrations.
pub fn pipeline_with(registrations: Vec<FunctionRegistration>) -> CallPipeline {
    let registry = Arc::new(FunctionRegistry::new());
    for registration in registrations {
        registry.register_function(registration);
    }
    CallPipeline::new(registry)
}

// ============================================================================
// SECTION: Identities
// ============================================================================

/// Caller with the given roles and group.
pub fn caller(roles: &[&str], group: Option<&str>) -> SecurityContext {
    SecurityContext::new("user-1", roles.iter().copied(), group.map(str::to_string))
}

/// Caller holding the admin role and no group.
pub fn admin() -> SecurityContext {
    caller(&["ADMIN"], None)
}
