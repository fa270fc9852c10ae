// crates/funclink-core/src/security.rs
// ============================================================================
// Module: Security Context
// Description: Caller identity, per-thread propagation, and access checks.
// Purpose: Enforce group and role requirements before a callable runs.
// Dependencies: serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! A [`SecurityContext`] describes the authenticated caller of an inbound
//! request. Boundary code installs it with a [`SecurityScope`] guard, which
//! binds it to the current thread and restores the previous value on drop.
//! [`crate::CallContext::inbound`] snapshots the scope once; from then on the
//! identity travels explicitly with the call.
//!
//! [`SecurityGate`] evaluates a callable's [`SecurityPolicy`] against the
//! caller. An absent caller context is treated as a trusted internal call
//! unless the gate is configured otherwise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::error::InvocationError;
use crate::metadata::SecurityPolicy;
use crate::time::now_unix_millis;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default role that bypasses group and role checks.
pub const DEFAULT_ADMIN_ROLE: &str = "ADMIN";

// ============================================================================
// SECTION: Security Context
// ============================================================================

/// Authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityContext {
    /// Caller user identifier.
    pub user_id: String,
    /// Roles held by the caller.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Security group the caller belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group: Option<String>,
    /// Additional identity claims.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub claims: BTreeMap<String, Value>,
    /// Optional session identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Unix milliseconds when the context was created.
    pub timestamp_ms: i64,
}

impl SecurityContext {
    /// Creates a context stamped with the current time.
    #[must_use]
    pub fn new<I, S>(user_id: impl Into<String>, roles: I, security_group: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id: user_id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            security_group,
            claims: BTreeMap::new(),
            session_id: None,
            timestamp_ms: now_unix_millis(),
        }
    }

    /// Returns a copy with an additional claim.
    #[must_use]
    pub fn with_claim(mut self, key: impl Into<String>, value: Value) -> Self {
        self.claims.insert(key.into(), value);
        self
    }

    /// Returns a copy with a session identifier.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Returns true when the caller holds the role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|held| held == role)
    }

    /// Returns true when the caller holds any of the roles.
    #[must_use]
    pub fn has_any_role<'a, I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        roles.into_iter().any(|role| self.has_role(role))
    }

    /// Returns true when the caller belongs to the group.
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.security_group.as_deref() == Some(group)
    }
}

// ============================================================================
// SECTION: Thread Scope
// ============================================================================

thread_local! {
    /// Security context bound to the current thread by [`SecurityScope`].
    static ACTIVE_CONTEXT: RefCell<Option<Arc<SecurityContext>>> = const { RefCell::new(None) };
}

/// RAII guard binding a [`SecurityContext`] to the current thread.
///
/// # Invariants
/// - Dropping the guard restores whatever context was active before it.
/// - The guard is `!Send`; it must drop on the thread that created it.
#[derive(Debug)]
#[must_use = "the context is cleared as soon as the scope is dropped"]
pub struct SecurityScope {
    /// Context that was active before this scope was entered.
    previous: Option<Arc<SecurityContext>>,
    /// Pins the guard to its creating thread.
    _thread_bound: PhantomData<*const ()>,
}

impl SecurityScope {
    /// Binds the context to the current thread until the guard drops.
    pub fn enter(context: SecurityContext) -> Self {
        let previous = ACTIVE_CONTEXT.with(|slot| slot.replace(Some(Arc::new(context))));
        Self {
            previous,
            _thread_bound: PhantomData,
        }
    }

    /// Returns the context bound to the current thread, if any.
    #[must_use]
    pub fn current() -> Option<Arc<SecurityContext>> {
        ACTIVE_CONTEXT.with(|slot| slot.borrow().clone())
    }
}

impl Drop for SecurityScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE_CONTEXT.with(|slot| {
            slot.replace(previous);
        });
    }
}

// ============================================================================
// SECTION: Security Gate
// ============================================================================

/// Access check applied before every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGate {
    /// Allows calls that carry no caller context.
    allow_unauthenticated_internal_calls: bool,
    /// Role that bypasses group and role checks.
    admin_role: String,
}

impl SecurityGate {
    /// Creates a gate.
    #[must_use]
    pub fn new(allow_unauthenticated_internal_calls: bool, admin_role: impl Into<String>) -> Self {
        Self {
            allow_unauthenticated_internal_calls,
            admin_role: admin_role.into(),
        }
    }

    /// Returns the admin role name.
    #[must_use]
    pub fn admin_role(&self) -> &str {
        &self.admin_role
    }

    /// Checks the caller against the target's policy.
    ///
    /// # Errors
    /// Returns [`InvocationError::AccessDenied`] when the caller is not in the
    /// required group, holds none of the required roles, or is absent while
    /// unauthenticated calls are disallowed.
    pub fn check(
        &self,
        component: &str,
        policy: Option<&SecurityPolicy>,
        caller: Option<&SecurityContext>,
    ) -> Result<(), InvocationError> {
        let Some(policy) = policy.filter(|policy| policy.is_restrictive()) else {
            return Ok(());
        };
        let Some(caller) = caller else {
            if self.allow_unauthenticated_internal_calls {
                debug!(component, "no caller context; treating as internal call");
                return Ok(());
            }
            warn!(component, "denied unauthenticated call");
            return Err(InvocationError::access_denied(component, "caller is not authenticated"));
        };
        let is_admin = caller.has_role(&self.admin_role);
        if let Some(group) = policy.group.as_deref()
            && !caller.in_group(group)
            && !is_admin
        {
            warn!(component, user = %caller.user_id, group, "denied by security group");
            return Err(InvocationError::access_denied(
                component,
                format!("caller is not in security group {group}"),
            ));
        }
        if !policy.roles.is_empty() && !caller.has_any_role(&policy.roles) && !is_admin {
            warn!(component, user = %caller.user_id, "denied by role requirement");
            return Err(InvocationError::access_denied(
                component,
                "caller holds none of the required roles",
            ));
        }
        Ok(())
    }
}

impl Default for SecurityGate {
    fn default() -> Self {
        Self::new(true, DEFAULT_ADMIN_ROLE)
    }
}
