// crates/funclink-core/src/registry.rs
// ============================================================================
// Module: Function Registry
// Description: Concurrent map from component key to callable and metadata.
// Purpose: Answer "is this component local, and how do I call it?"
// Dependencies: dashmap, tracing
// ============================================================================

//! ## Overview
//! The function registry stores every locally callable component under its
//! component key. Registration and lookup are safe from many threads at
//! once; re-registering a key replaces the previous entry (last writer wins).
//! Metadata is immutable once stored and handed out behind an [`Arc`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use tracing::info;

use crate::function::DiscoveredFunction;
use crate::function::Function;
use crate::function::FunctionRegistration;
use crate::metadata::FunctionMetadata;

// ============================================================================
// SECTION: Registry Entry
// ============================================================================

/// One registered callable with its metadata.
#[derive(Clone)]
pub struct RegistryEntry {
    /// The callable.
    pub function: Arc<dyn Function>,
    /// Metadata describing the callable.
    pub metadata: Arc<FunctionMetadata>,
}

// ============================================================================
// SECTION: Function Registry
// ============================================================================

/// Registry of locally callable components.
///
/// # Invariants
/// - A component key maps to at most one entry.
/// - Every entry's `metadata.component` equals its key.
#[derive(Default)]
pub struct FunctionRegistry {
    /// Entries keyed by component key.
    entries: DashMap<String, RegistryEntry>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callable, replacing any existing entry for the key.
    ///
    /// When `metadata` is `None`, minimal metadata (name equals key) is
    /// stored.
    pub fn register(
        &self,
        component: impl Into<String>,
        function: Arc<dyn Function>,
        metadata: Option<FunctionMetadata>,
    ) {
        let component = component.into();
        let mut metadata =
            metadata.unwrap_or_else(|| FunctionMetadata::minimal(component.clone()));
        if metadata.component != component {
            debug!(
                component = %component,
                declared = %metadata.component,
                "metadata component differs from registry key; using key"
            );
            metadata.component.clone_from(&component);
        }
        let entry = RegistryEntry {
            function,
            metadata: Arc::new(metadata),
        };
        if self.entries.insert(component.clone(), entry).is_some() {
            info!(component = %component, "replaced registered function");
        } else {
            debug!(component = %component, "registered function");
        }
    }

    /// Registers a prepared [`FunctionRegistration`].
    pub fn register_function(&self, registration: FunctionRegistration) {
        let (metadata, function) = registration.into_parts();
        self.register(metadata.component.clone(), function, Some(metadata));
    }

    /// Bulk-registers callables produced by a discovery source.
    ///
    /// Returns the number of entries registered.
    pub fn register_discovered<I>(&self, discovered: I) -> usize
    where
        I: IntoIterator<Item = DiscoveredFunction>,
    {
        let mut count = 0;
        for item in discovered {
            self.register(item.component, item.function, item.metadata);
            count += 1;
        }
        info!(count, "registered discovered functions");
        count
    }

    /// Returns the entry for a component key.
    #[must_use]
    pub fn lookup(&self, component: &str) -> Option<RegistryEntry> {
        self.entries.get(component).map(|entry| entry.value().clone())
    }

    /// Returns the metadata for a component key.
    #[must_use]
    pub fn metadata(&self, component: &str) -> Option<Arc<FunctionMetadata>> {
        self.entries.get(component).map(|entry| Arc::clone(&entry.metadata))
    }

    /// Returns true when the key is registered.
    #[must_use]
    pub fn is_registered(&self, component: &str) -> bool {
        self.entries.contains_key(component)
    }

    /// Returns all registered component keys in sorted order.
    #[must_use]
    pub fn components(&self) -> BTreeSet<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Returns a snapshot of all entries sorted by component key.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, RegistryEntry)> {
        let mut entries: Vec<(String, RegistryEntry)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|left, right| left.0.cmp(&right.0));
        entries
    }

    /// Returns the metadata of every entry sorted by component key.
    #[must_use]
    pub fn all_metadata(&self) -> Vec<Arc<FunctionMetadata>> {
        self.entries().into_iter().map(|(_, entry)| entry.metadata).collect()
    }

    /// Returns the number of registered entries.
    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
        debug!("cleared function registry");
    }
}
