// crates/funclink-remote/src/endpoints.rs
// ============================================================================
// Module: Remote Endpoints
// Description: Component-to-URL mapping for proxied components.
// Purpose: Collect remote URLs from the environment or programmatic setup.
// Dependencies: dashmap, funclink-core, url
// ============================================================================

//! ## Overview
//! [`RemoteEndpoints`] maps component keys to validated URLs. Keys are
//! compared case-insensitively; the spelling used at registration is kept
//! for display. Environment entries are read as
//! `<prefix><component>=<url>`, for example
//! `FUNCLINK_REMOTE_URL_INVENTORYCHECKER=https://inventory.internal/check`.
//!
//! Endpoint URLs must use `http` or `https` and must not embed credentials.
//!
//! The table also holds [`FunctionMetadata`] for remote components so the
//! pipeline applies the same security policy whether a component runs
//! locally or behind its endpoint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use dashmap::DashMap;
use funclink_core::FunctionMetadata;
use funclink_core::TypeDescriptor;
use thiserror::Error;
use tracing::info;
use tracing::warn;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment prefix for remote endpoint entries.
pub const DEFAULT_ENV_PREFIX: &str = "FUNCLINK_REMOTE_URL_";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while registering a remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// Component key is empty after trimming.
    #[error("remote endpoint component key is empty")]
    EmptyComponent,
    /// URL failed to parse or violates endpoint policy.
    #[error("invalid remote endpoint url for {component}: {reason}")]
    InvalidUrl {
        /// Component the URL was registered for.
        component: String,
        /// Why the URL was rejected.
        reason: String,
    },
}

// ============================================================================
// SECTION: Endpoint
// ============================================================================

/// One configured remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    /// Component key as registered.
    pub component: String,
    /// Target URL for the `POST`.
    pub url: Url,
    /// Declared output type used to check response shapes.
    pub output_type: Option<TypeDescriptor>,
}

impl RemoteEndpoint {
    /// Parses and validates an endpoint.
    ///
    /// # Errors
    /// Returns [`EndpointError`] when the component is empty or the URL is
    /// unusable.
    pub fn parse(component: &str, url: &str) -> Result<Self, EndpointError> {
        let component = component.trim();
        if component.is_empty() {
            return Err(EndpointError::EmptyComponent);
        }
        let parsed = Url::parse(url.trim()).map_err(|err| EndpointError::InvalidUrl {
            component: component.to_string(),
            reason: err.to_string(),
        })?;
        validate_url(component, &parsed)?;
        Ok(Self {
            component: component.to_string(),
            url: parsed,
            output_type: None,
        })
    }

    /// Returns a copy that checks response shapes against `descriptor`.
    #[must_use]
    pub fn with_output_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.output_type = Some(descriptor);
        self
    }
}

/// Validates URL scheme and credentials.
fn validate_url(component: &str, url: &Url) -> Result<(), EndpointError> {
    let reject = |reason: &str| EndpointError::InvalidUrl {
        component: component.to_string(),
        reason: reason.to_string(),
    };
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(reject("unsupported url scheme")),
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(reject("url credentials are not allowed"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(reject("url host required"));
    }
    Ok(())
}

/// Normalizes a component key for case-insensitive matching.
fn normalize_key(component: &str) -> String {
    component.trim().to_lowercase()
}

// ============================================================================
// SECTION: Endpoint Table
// ============================================================================

/// Case-insensitive table of remote endpoints.
///
/// # Invariants
/// - At most one endpoint per normalized component key; later registrations
///   replace earlier ones.
/// - Metadata is kept per normalized key independently of the URL, so
///   replacing a URL keeps the component's policy.
#[derive(Debug, Default)]
pub struct RemoteEndpoints {
    /// Endpoints keyed by lowercased component key.
    entries: DashMap<String, RemoteEndpoint>,
    /// Declared metadata keyed by lowercased component key.
    metadata: DashMap<String, FunctionMetadata>,
}

impl RemoteEndpoints {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(name, value)` pairs, keeping those whose name
    /// starts with `prefix`. Invalid entries are logged and skipped.
    #[must_use]
    pub fn from_vars<I, K, V>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let endpoints = Self::new();
        endpoints.load_vars(prefix, vars);
        endpoints
    }

    /// Builds a table from the process environment.
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Adds matching `(name, value)` pairs and returns how many were accepted.
    pub fn load_vars<I, K, V>(&self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut loaded = 0;
        for (name, value) in vars {
            let Some(component) = name.as_ref().strip_prefix(prefix) else {
                continue;
            };
            match self.register(component, value.as_ref()) {
                Ok(()) => loaded += 1,
                Err(err) => warn!(variable = name.as_ref(), error = %err, "skipped remote endpoint"),
            }
        }
        loaded
    }

    /// Registers a URL for a component.
    ///
    /// # Errors
    /// Returns [`EndpointError`] when the component or URL is rejected.
    pub fn register(&self, component: &str, url: &str) -> Result<(), EndpointError> {
        self.insert(RemoteEndpoint::parse(component, url)?);
        Ok(())
    }

    /// Registers a pre-validated endpoint.
    pub fn insert(&self, endpoint: RemoteEndpoint) {
        info!(component = %endpoint.component, url = %endpoint.url, "registered remote endpoint");
        self.entries.insert(normalize_key(&endpoint.component), endpoint);
    }

    /// Returns the endpoint for a component, ignoring case.
    #[must_use]
    pub fn get(&self, component: &str) -> Option<RemoteEndpoint> {
        self.entries.get(&normalize_key(component)).map(|entry| entry.value().clone())
    }

    /// Returns the URL configured for a component, ignoring case.
    #[must_use]
    pub fn url_for(&self, component: &str) -> Option<Url> {
        self.entries.get(&normalize_key(component)).map(|entry| entry.url.clone())
    }

    /// Returns true when a component has a configured endpoint.
    #[must_use]
    pub fn contains(&self, component: &str) -> bool {
        self.entries.contains_key(&normalize_key(component))
    }

    /// Removes a component's endpoint and metadata, returning the endpoint
    /// when present.
    pub fn remove(&self, component: &str) -> Option<RemoteEndpoint> {
        let key = normalize_key(component);
        self.metadata.remove(&key);
        self.entries.remove(&key).map(|(_, endpoint)| endpoint)
    }

    /// Declares the metadata a remote component is invoked under.
    pub fn describe(&self, metadata: FunctionMetadata) {
        self.metadata.insert(normalize_key(&metadata.component), metadata);
    }

    /// Returns the declared metadata for a component, ignoring case.
    #[must_use]
    pub fn metadata_for(&self, component: &str) -> Option<FunctionMetadata> {
        self.metadata.get(&normalize_key(component)).map(|entry| entry.value().clone())
    }

    /// Returns configured component keys as registered.
    #[must_use]
    pub fn components(&self) -> BTreeSet<String> {
        self.entries.iter().map(|entry| entry.component.clone()).collect()
    }

    /// Returns the number of configured endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no endpoint is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
