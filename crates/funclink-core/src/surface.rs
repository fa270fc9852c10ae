// crates/funclink-core/src/surface.rs
// ============================================================================
// Module: Discovery Surface
// Description: Serializable catalog, metrics, dependency, and health reports.
// Purpose: Expose read-only views for operators and front ends.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`Discovery`] borrows a [`CallPipeline`] and builds read-only reports:
//! the function catalog, per-function detail, metrics and dependency reports,
//! and a health summary. Every report is plain data that serializes to JSON.
//!
//! [`ErrorResponse`] maps an [`InvocationError`] to the structured body an
//! outer surface returns to external callers. Access denials are reported
//! with a generic message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::dependency::DependencyInfo;
use crate::error::InvocationError;
use crate::function::resolve_input_descriptor;
use crate::function::resolve_output_descriptor;
use crate::metadata::DeploymentHints;
use crate::metadata::SecurityPolicy;
use crate::metadata::TypeDescriptor;
use crate::metrics::MetricsSnapshot;
use crate::metrics::MetricsSummary;
use crate::pipeline::CallPipeline;
use crate::registry::RegistryEntry;
use crate::time::now_unix_millis;

// ============================================================================
// SECTION: Report Types
// ============================================================================

/// Headline metrics embedded in catalog entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsDigest {
    /// All recorded invocations.
    pub total_calls: u64,
    /// Success percentage, rounded to two decimals.
    pub success_rate: f64,
    /// Mean duration, rounded to two decimals.
    pub average_duration_ms: f64,
}

/// One entry in the function catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSummary {
    /// Display name.
    pub name: String,
    /// Component key.
    pub component: String,
    /// Input type name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// Output type name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    /// Security requirements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityPolicy>,
    /// Deployment hints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentHints>,
    /// Headline metrics, when the function has been called.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsDigest>,
    /// Dependency summary.
    pub dependencies: DependencyInfo,
}

/// Catalog-wide counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    /// Registered functions.
    pub total_functions: usize,
    /// Functions per declared security group.
    pub security_groups: BTreeMap<String, usize>,
}

/// Catalog of every locally registered function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCatalog {
    /// Number of entries.
    pub count: usize,
    /// Entries sorted by component key.
    pub functions: Vec<FunctionSummary>,
    /// Catalog-wide counts.
    pub summary: CatalogSummary,
}

/// Full detail for one function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDetail {
    /// Catalog entry.
    #[serde(flatten)]
    pub summary: FunctionSummary,
    /// Resolved input descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<TypeDescriptor>,
    /// Resolved output descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<TypeDescriptor>,
    /// Full metrics snapshot, when the function has been called.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_detail: Option<MetricsSnapshot>,
}

/// Metrics for every component plus the aggregate summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    /// Rounded snapshots keyed by component.
    pub metrics: BTreeMap<String, MetricsSnapshot>,
    /// Aggregate summary.
    pub summary: MetricsSummary,
    /// Number of components with metrics.
    pub count: usize,
}

/// Full dependency analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    /// Summary per known component.
    pub dependencies: BTreeMap<String, DependencyInfo>,
    /// Detected cycles.
    pub cycles: Vec<Vec<String>>,
    /// Components that call nothing.
    pub leaf_functions: BTreeSet<String>,
    /// Components nothing calls.
    pub root_functions: BTreeSet<String>,
    /// Graphviz rendering of the graph.
    pub dot_graph: String,
}

/// Feature flags reported by the health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthFeatures {
    /// Metrics tracking is active.
    pub metrics_tracking: bool,
    /// Dependency analysis is active.
    pub dependency_analysis: bool,
    /// A remote resolver is configured.
    pub remote_proxy: bool,
}

/// Liveness summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Always `UP` while the process can answer.
    pub status: &'static str,
    /// Number of locally registered functions.
    pub registered_functions: usize,
    /// Locally registered component keys.
    pub function_names: BTreeSet<String>,
    /// Components reachable through the remote resolver.
    pub remote_functions: BTreeSet<String>,
    /// Active features.
    pub features: HealthFeatures,
    /// Unix milliseconds when the report was built.
    pub timestamp_ms: i64,
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Read-only report builder over a pipeline.
pub struct Discovery<'a> {
    /// Pipeline being described.
    pipeline: &'a CallPipeline,
}

impl<'a> Discovery<'a> {
    /// Creates a discovery view.
    #[must_use]
    pub const fn new(pipeline: &'a CallPipeline) -> Self {
        Self {
            pipeline,
        }
    }

    /// Lists every locally registered function.
    #[must_use]
    pub fn catalog(&self) -> FunctionCatalog {
        let functions: Vec<FunctionSummary> = self
            .pipeline
            .registry()
            .entries()
            .iter()
            .map(|(component, entry)| self.summarize(component, entry))
            .collect();
        let mut security_groups: BTreeMap<String, usize> = BTreeMap::new();
        for function in &functions {
            if let Some(group) = function.security.as_ref().and_then(|policy| policy.group.clone()) {
                *security_groups.entry(group).or_default() += 1;
            }
        }
        FunctionCatalog {
            count: functions.len(),
            summary: CatalogSummary {
                total_functions: functions.len(),
                security_groups,
            },
            functions,
        }
    }

    /// Returns full detail for one locally registered function.
    #[must_use]
    pub fn describe(&self, component: &str) -> Option<FunctionDetail> {
        let entry = self.pipeline.registry().lookup(component)?;
        Some(FunctionDetail {
            summary: self.summarize(component, &entry),
            input: resolve_input_descriptor(&entry.metadata, entry.function.as_ref()),
            output: resolve_output_descriptor(&entry.metadata, entry.function.as_ref()),
            metrics_detail: self.pipeline.metrics().metrics_of(component).map(MetricsSnapshot::rounded),
        })
    }

    /// Returns rounded metrics for every component.
    #[must_use]
    pub fn metrics(&self) -> MetricsReport {
        let metrics: BTreeMap<String, MetricsSnapshot> = self
            .pipeline
            .metrics()
            .all_metrics()
            .into_iter()
            .map(|(component, snapshot)| (component, snapshot.rounded()))
            .collect();
        MetricsReport {
            summary: MetricsSummary::from_snapshots(metrics.values()),
            count: metrics.len(),
            metrics,
        }
    }

    /// Returns rounded metrics for one component, if it has been called.
    #[must_use]
    pub fn metrics_of(&self, component: &str) -> Option<MetricsSnapshot> {
        self.pipeline.metrics().metrics_of(component).map(MetricsSnapshot::rounded)
    }

    /// Returns the dependency summary for one component.
    #[must_use]
    pub fn dependencies_of(&self, component: &str) -> DependencyInfo {
        self.pipeline.dependencies().dependency_info(component)
    }

    /// Returns the full dependency analysis.
    #[must_use]
    pub fn dependencies(&self) -> DependencyReport {
        let analyzer = self.pipeline.dependencies();
        let dependencies = analyzer
            .dependency_graph()
            .into_keys()
            .map(|component| {
                let info = analyzer.dependency_info(&component);
                (component, info)
            })
            .collect();
        DependencyReport {
            dependencies,
            cycles: analyzer.find_cycles(),
            leaf_functions: analyzer.leaf_functions(),
            root_functions: analyzer.root_functions(),
            dot_graph: analyzer.export_graph(),
        }
    }

    /// Returns the liveness summary.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        let function_names = self.pipeline.registry().components();
        HealthReport {
            status: "UP",
            registered_functions: function_names.len(),
            function_names,
            remote_functions: self.pipeline.remote_components(),
            features: HealthFeatures {
                metrics_tracking: true,
                dependency_analysis: true,
                remote_proxy: self.pipeline.has_resolver(),
            },
            timestamp_ms: now_unix_millis(),
        }
    }

    /// Builds the catalog entry for one registry entry.
    fn summarize(&self, component: &str, entry: &RegistryEntry) -> FunctionSummary {
        let metadata = &entry.metadata;
        let function = entry.function.as_ref();
        FunctionSummary {
            name: metadata.name.clone(),
            component: component.to_string(),
            input_type: resolve_input_descriptor(metadata, function).map(|desc| desc.name),
            output_type: resolve_output_descriptor(metadata, function).map(|desc| desc.name),
            security: metadata.security.clone(),
            deployment: metadata.deployment.clone(),
            metrics: self.pipeline.metrics().metrics_of(component).map(|snapshot| {
                let snapshot = snapshot.rounded();
                MetricsDigest {
                    total_calls: snapshot.total_calls,
                    success_rate: snapshot.success_rate,
                    average_duration_ms: snapshot.average_duration_ms,
                }
            }),
            dependencies: self.pipeline.dependencies().dependency_info(component),
        }
    }
}

// ============================================================================
// SECTION: Error Responses
// ============================================================================

/// Error category exposed to external callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Component key unknown.
    NotFound,
    /// Caller not permitted.
    Forbidden,
    /// Anything else.
    ExecutionFailed,
}

impl ErrorCategory {
    /// Returns the matching HTTP status code.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::ExecutionFailed => 500,
        }
    }
}

/// Structured error body for external callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// HTTP status code.
    pub status: u16,
    /// Error category.
    pub error: ErrorCategory,
    /// Caller-facing message.
    pub message: String,
    /// Error kind label.
    pub kind: String,
    /// Component involved, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Trace identifier for log correlation.
    pub trace_id: String,
    /// Unix milliseconds when the response was built.
    pub timestamp_ms: i64,
}

impl ErrorResponse {
    /// Maps an invocation error to a response body.
    #[must_use]
    pub fn from_error(err: &InvocationError, trace_id: impl Into<String>) -> Self {
        let (error, message) = match err {
            InvocationError::LookupMiss {
                ..
            } => (ErrorCategory::NotFound, err.to_string()),
            InvocationError::AccessDenied {
                ..
            } => (ErrorCategory::Forbidden, "Access denied".to_string()),
            _ => (ErrorCategory::ExecutionFailed, err.to_string()),
        };
        Self {
            status: error.http_status(),
            error,
            message,
            kind: err.kind().to_string(),
            component: err.component().map(str::to_string),
            trace_id: trace_id.into(),
            timestamp_ms: now_unix_millis(),
        }
    }
}
