// crates/funclink-core/src/context.rs
// ============================================================================
// Module: Call Context
// Description: Per-invocation caller identity and calling component.
// Purpose: Carry who is calling through nested invocations explicitly.
// Dependencies: none
// ============================================================================

//! ## Overview
//! A [`CallContext`] travels with every invocation. It holds the caller's
//! [`SecurityContext`] (if any), the component currently executing (used to
//! record dependency edges) and an optional trace identifier. Nested calls
//! receive a child context from [`CallContext::enter`], so the dependency
//! caller is always the component whose callable issued the nested call.

use std::sync::Arc;

use crate::security::SecurityContext;
use crate::security::SecurityScope;

/// Identity and caller information for one invocation.
///
/// # Invariants
/// - `caller` is `None` only for calls issued from outside any callable.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Authenticated caller identity.
    security: Option<Arc<SecurityContext>>,
    /// Component whose callable issued this call.
    caller: Option<String>,
    /// Trace identifier for log correlation.
    trace_id: Option<String>,
}

impl CallContext {
    /// Context for a trusted internal call with no caller identity.
    #[must_use]
    pub fn internal() -> Self {
        Self::default()
    }

    /// Context carrying an authenticated caller.
    #[must_use]
    pub fn authenticated(security: SecurityContext) -> Self {
        Self {
            security: Some(Arc::new(security)),
            ..Self::default()
        }
    }

    /// Context built from the identity bound by the active [`SecurityScope`].
    #[must_use]
    pub fn inbound() -> Self {
        Self {
            security: SecurityScope::current(),
            ..Self::default()
        }
    }

    /// Returns a copy with a trace identifier.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Returns a copy that reports `caller` as the calling component.
    #[must_use]
    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    /// Returns the child context for calls issued by `component`.
    #[must_use]
    pub fn enter(&self, component: &str) -> Self {
        Self {
            security: self.security.clone(),
            caller: Some(component.to_string()),
            trace_id: self.trace_id.clone(),
        }
    }

    /// Returns the caller identity.
    #[must_use]
    pub fn security(&self) -> Option<&SecurityContext> {
        self.security.as_deref()
    }

    /// Returns the calling component key.
    #[must_use]
    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    /// Returns the trace identifier.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }
}
