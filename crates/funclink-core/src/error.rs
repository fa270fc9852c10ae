// crates/funclink-core/src/error.rs
// ============================================================================
// Module: Invocation Errors
// Description: Error taxonomy for function lookup, authorization, and calls.
// Purpose: Give every pipeline failure a stable kind label for metrics.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`InvocationError`] is the single error type returned by the call pipeline.
//! Each variant carries a stable [`InvocationError::kind`] label that metrics
//! use as the error-count key. Errors raised by a target callable travel as
//! [`FunctionError`] and keep their own kind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Kind Labels
// ============================================================================

/// Kind label for lookup misses.
pub const KIND_LOOKUP_MISS: &str = "lookup_miss";
/// Kind label for security denials.
pub const KIND_ACCESS_DENIED: &str = "access_denied";
/// Kind label for input/output conversion failures.
pub const KIND_TYPE_CONVERSION: &str = "type_conversion";
/// Kind label for remote invocation failures.
pub const KIND_REMOTE_INVOCATION: &str = "remote_invocation";
/// Kind label recorded when a callable panics.
pub const KIND_PANIC: &str = "panic";

// ============================================================================
// SECTION: Function Errors
// ============================================================================

/// Error raised by a target callable's own business logic.
///
/// # Invariants
/// - `kind` is a short, stable label suitable for metrics keys.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct FunctionError {
    /// Stable error kind label.
    kind: String,
    /// Human-readable failure description.
    message: String,
}

impl FunctionError {
    /// Creates a function error with an explicit kind.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Creates an `invalid_input` function error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new("invalid_input", message)
    }

    /// Returns the error kind label.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// SECTION: Remote Errors
// ============================================================================

/// Failure reported by a remote proxy callable.
///
/// `status` is `None` when the request never produced an HTTP response
/// (connection refused, timeout, oversized or malformed body).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote invocation of {component} failed ({}): {detail}", status_label(.status))]
pub struct RemoteInvocationError {
    /// Component key that was proxied.
    pub component: String,
    /// HTTP status code when a response was received.
    pub status: Option<u16>,
    /// Response body or transport error description.
    pub detail: String,
}

impl RemoteInvocationError {
    /// Builds an error for a non-success HTTP status.
    #[must_use]
    pub fn status(component: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: Some(status),
            detail: body.into(),
        }
    }

    /// Builds an error for a transport or decoding failure.
    #[must_use]
    pub fn transport(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: None,
            detail: detail.into(),
        }
    }
}

/// Formats an optional HTTP status for error display.
fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |code| format!("status {code}"))
}

// ============================================================================
// SECTION: Invocation Errors
// ============================================================================

/// Which side of a call failed to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionDirection {
    /// Caller input could not be converted to the declared input type.
    Input,
    /// Callable output could not be converted to the expected output type.
    Output,
}

impl fmt::Display for ConversionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Errors returned by the call pipeline.
///
/// # Invariants
/// - [`InvocationError::kind`] is stable per variant, except `Underlying`,
///   which reports the callable's own kind.
#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    /// Component key is neither registered locally nor remotely resolvable.
    #[error("function not found: {component}")]
    LookupMiss {
        /// Requested component key.
        component: String,
    },
    /// Caller lacks the group or role the target requires.
    #[error("access denied to {component}: {reason}")]
    AccessDenied {
        /// Target component key.
        component: String,
        /// Denial reason (not exposed to external callers).
        reason: String,
    },
    /// Input or output could not be coerced to the declared type.
    #[error("type conversion failed for {component} ({direction}): {message}")]
    TypeConversion {
        /// Target component key.
        component: String,
        /// Side of the call that failed.
        direction: ConversionDirection,
        /// Decoder error message.
        message: String,
    },
    /// Remote endpoint returned a non-success status or an unusable body.
    #[error(transparent)]
    RemoteInvocation(#[from] RemoteInvocationError),
    /// The target callable itself failed.
    #[error("function failed: {0}")]
    Underlying(#[from] FunctionError),
}

impl InvocationError {
    /// Builds a lookup-miss error.
    #[must_use]
    pub fn lookup_miss(component: impl Into<String>) -> Self {
        Self::LookupMiss {
            component: component.into(),
        }
    }

    /// Builds an access-denied error.
    #[must_use]
    pub fn access_denied(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AccessDenied {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Builds a type-conversion error.
    #[must_use]
    pub fn conversion(
        component: impl Into<String>,
        direction: ConversionDirection,
        message: impl Into<String>,
    ) -> Self {
        Self::TypeConversion {
            component: component.into(),
            direction,
            message: message.into(),
        }
    }

    /// Returns the stable kind label used for metrics error counts.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::LookupMiss {
                ..
            } => KIND_LOOKUP_MISS,
            Self::AccessDenied {
                ..
            } => KIND_ACCESS_DENIED,
            Self::TypeConversion {
                ..
            } => KIND_TYPE_CONVERSION,
            Self::RemoteInvocation(_) => KIND_REMOTE_INVOCATION,
            Self::Underlying(err) => err.kind(),
        }
    }

    /// Returns the component key the error concerns, when known.
    #[must_use]
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::LookupMiss {
                component,
            }
            | Self::AccessDenied {
                component, ..
            }
            | Self::TypeConversion {
                component, ..
            } => Some(component),
            Self::RemoteInvocation(err) => Some(&err.component),
            Self::Underlying(_) => None,
        }
    }

    /// Returns true when the error is a security denial.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}
