// crates/funclink-core/src/metadata.rs
// ============================================================================
// Module: Function Metadata
// Description: Descriptive metadata attached to registered callables.
// Purpose: Carry type descriptors, security policy, and deployment hints.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`FunctionMetadata`] describes one registered callable. It is immutable
//! once stored in the registry. Type information is carried as a
//! [`TypeDescriptor`]: a readable type name plus a coarse JSON [`ShapeTag`]
//! used to sanity-check untyped inputs and remote outputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Type Descriptors
// ============================================================================

/// Coarse JSON shape expected for a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeTag {
    /// Any JSON value is accepted.
    #[default]
    Any,
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool,
    /// JSON number.
    Number,
    /// JSON string.
    String,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
}

impl ShapeTag {
    /// Returns the shape of a concrete JSON value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Returns true when the value matches this shape.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        self == Self::Any || self == Self::of(value)
    }

    /// Returns the stable label for this shape.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared input or output type of a callable.
///
/// # Invariants
/// - `name` is the unqualified type name; `rust_type` is the full path when
///   the descriptor was derived from a Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Short, human-readable type name.
    pub name: String,
    /// Fully-qualified Rust type path when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rust_type: Option<String>,
    /// Expected JSON shape.
    #[serde(default)]
    pub shape: ShapeTag,
}

impl TypeDescriptor {
    /// Creates a descriptor with an explicit name and shape.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: ShapeTag) -> Self {
        Self {
            name: name.into(),
            rust_type: None,
            shape,
        }
    }

    /// Derives a descriptor from a Rust type. The shape defaults to
    /// [`ShapeTag::Any`] because serde decoding performs the real check.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        Self {
            name: short_type_name(full),
            rust_type: Some(full.to_string()),
            shape: ShapeTag::Any,
        }
    }

    /// Returns a copy with the JSON shape replaced.
    #[must_use]
    pub fn with_shape(mut self, shape: ShapeTag) -> Self {
        self.shape = shape;
        self
    }
}

/// Strips module paths from a Rust type name, keeping generic arguments.
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(last_path_segment(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

/// Returns the final `::`-separated segment of a path.
fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

// ============================================================================
// SECTION: Security Policy
// ============================================================================

/// Security requirements declared by a callable.
///
/// # Invariants
/// - An empty `roles` set means no role check is applied.
/// - `group: None` means no group check is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    /// Security group the caller must belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Roles of which the caller must hold at least one.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub roles: BTreeSet<String>,
    /// Informational authentication mode label (for example `jwt`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    /// Informational flag for elevated execution.
    #[serde(default)]
    pub elevated: bool,
}

impl SecurityPolicy {
    /// Creates an empty policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy requiring the given security group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Returns a copy requiring one of the given roles.
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Returns a copy with an authentication mode label.
    #[must_use]
    pub fn with_authentication(mut self, mode: impl Into<String>) -> Self {
        self.authentication = Some(mode.into());
        self
    }

    /// Returns a copy with the elevated flag set.
    #[must_use]
    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    /// Returns true when the policy imposes any access check.
    #[must_use]
    pub fn is_restrictive(&self) -> bool {
        self.group.is_some() || !self.roles.is_empty()
    }
}

// ============================================================================
// SECTION: Deployment Hints
// ============================================================================

/// Informational deployment hints. Never consulted at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentHints {
    /// Target cloud or platform label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    /// Memory sizing hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    /// Timeout hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

// ============================================================================
// SECTION: Function Metadata
// ============================================================================

/// Descriptive metadata for one registered callable.
///
/// # Invariants
/// - `component` equals the registry key the metadata is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMetadata {
    /// Display name.
    pub name: String,
    /// Component key.
    pub component: String,
    /// Declared input type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<TypeDescriptor>,
    /// Declared output type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<TypeDescriptor>,
    /// Security requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityPolicy>,
    /// Deployment hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentHints>,
}

impl FunctionMetadata {
    /// Creates metadata with a display name and component key.
    #[must_use]
    pub fn new(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
            input_type: None,
            output_type: None,
            security: None,
            deployment: None,
        }
    }

    /// Creates metadata whose display name equals the component key.
    #[must_use]
    pub fn minimal(component: impl Into<String>) -> Self {
        let component = component.into();
        Self::new(component.clone(), component)
    }

    /// Returns a copy with a declared input type.
    #[must_use]
    pub fn with_input_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.input_type = Some(descriptor);
        self
    }

    /// Returns a copy with a declared output type.
    #[must_use]
    pub fn with_output_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.output_type = Some(descriptor);
        self
    }

    /// Returns a copy with a security policy.
    #[must_use]
    pub fn with_security(mut self, policy: SecurityPolicy) -> Self {
        self.security = Some(policy);
        self
    }

    /// Returns a copy with deployment hints.
    #[must_use]
    pub fn with_deployment(mut self, hints: DeploymentHints) -> Self {
        self.deployment = Some(hints);
        self
    }

    /// Returns the declared security group, if any.
    #[must_use]
    pub fn security_group(&self) -> Option<&str> {
        self.security.as_ref().and_then(|policy| policy.group.as_deref())
    }
}
