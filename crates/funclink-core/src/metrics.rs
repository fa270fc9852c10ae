// crates/funclink-core/src/metrics.rs
// ============================================================================
// Module: Metrics Tracker
// Description: Lock-free per-component call counters and latency stats.
// Purpose: Record every invocation outcome without serializing callers.
// Dependencies: dashmap, serde, tracing
// ============================================================================

//! ## Overview
//! Each component gets one [`FunctionMetrics`] record made of atomic
//! counters. Success and failure counters, duration totals, and min/max
//! latencies are updated without locks; min and max use compare-and-swap
//! loops so concurrent updates never lose a lower or higher value.
//!
//! Readers take a [`MetricsSnapshot`]. Snapshots derive `total_calls` from
//! the success and failure counters, so `total = successful + failed` holds
//! in every snapshot even while updates are in flight.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::time::now_unix_millis;

// ============================================================================
// SECTION: Function Metrics
// ============================================================================

/// Live counters for one component.
#[derive(Debug)]
pub struct FunctionMetrics {
    /// Component key.
    component: String,
    /// Successful invocations.
    successful: AtomicU64,
    /// Failed invocations.
    failed: AtomicU64,
    /// Sum of all durations in milliseconds.
    total_duration_ms: AtomicU64,
    /// Smallest observed duration; `u64::MAX` until the first call.
    min_duration_ms: AtomicU64,
    /// Largest observed duration.
    max_duration_ms: AtomicU64,
    /// Failure counts keyed by error kind.
    error_counts: DashMap<String, AtomicU64>,
    /// Unix milliseconds of the first recorded call; zero until then.
    first_call_ms: AtomicI64,
    /// Unix milliseconds of the latest recorded call.
    last_call_ms: AtomicI64,
}

impl FunctionMetrics {
    /// Creates an empty record.
    fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            successful: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            total_duration_ms: AtomicU64::new(0),
            min_duration_ms: AtomicU64::new(u64::MAX),
            max_duration_ms: AtomicU64::new(0),
            error_counts: DashMap::new(),
            first_call_ms: AtomicI64::new(0),
            last_call_ms: AtomicI64::new(0),
        }
    }

    /// Records a successful call.
    fn record_success(&self, duration_ms: u64) {
        self.observe(duration_ms);
        self.successful.fetch_add(1, Ordering::AcqRel);
    }

    /// Records a failed call.
    fn record_failure(&self, duration_ms: u64, error_kind: &str) {
        self.observe(duration_ms);
        self.error_counts
            .entry(error_kind.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::AcqRel);
    }

    /// Updates duration and timestamp fields shared by both outcomes.
    fn observe(&self, duration_ms: u64) {
        self.total_duration_ms.fetch_add(duration_ms, Ordering::Relaxed);
        lower_to(&self.min_duration_ms, duration_ms);
        self.max_duration_ms.fetch_max(duration_ms, Ordering::Relaxed);
        let now = now_unix_millis();
        let _ = self.first_call_ms.compare_exchange(0, now, Ordering::AcqRel, Ordering::Relaxed);
        self.last_call_ms.fetch_max(now, Ordering::Relaxed);
    }

    /// Takes a consistent-enough snapshot of the counters.
    fn snapshot(&self) -> MetricsSnapshot {
        let successful_calls = self.successful.load(Ordering::Acquire);
        let failed_calls = self.failed.load(Ordering::Acquire);
        let total_calls = successful_calls + failed_calls;
        let total_duration_ms = self.total_duration_ms.load(Ordering::Relaxed);
        let min_raw = self.min_duration_ms.load(Ordering::Relaxed);
        let error_counts = self
            .error_counts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect();
        MetricsSnapshot {
            component: self.component.clone(),
            total_calls,
            successful_calls,
            failed_calls,
            total_duration_ms,
            min_duration_ms: if min_raw == u64::MAX { 0 } else { min_raw },
            max_duration_ms: self.max_duration_ms.load(Ordering::Relaxed),
            average_duration_ms: ratio(total_duration_ms, total_calls),
            success_rate: ratio(successful_calls, total_calls) * 100.0,
            error_counts,
            first_call_ms: self.first_call_ms.load(Ordering::Relaxed),
            last_call_ms: self.last_call_ms.load(Ordering::Relaxed),
        }
    }
}

/// Lowers `cell` to `candidate` when the candidate is smaller.
fn lower_to(cell: &AtomicU64, candidate: u64) {
    let mut current = cell.load(Ordering::Relaxed);
    while candidate < current {
        match cell.compare_exchange_weak(current, candidate, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return,
            Err(observed) => current = observed,
        }
    }
}

/// Returns `numerator / denominator`, or zero when the denominator is zero.
#[allow(clippy::cast_precision_loss, reason = "Counters stay far below 2^52 in practice.")]
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Rounds to two decimal places for reports.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// SECTION: Snapshots
// ============================================================================

/// Point-in-time view of one component's metrics.
///
/// # Invariants
/// - `total_calls == successful_calls + failed_calls`.
/// - `min_duration_ms` is zero when no call has been recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Component key.
    pub component: String,
    /// All recorded invocations.
    pub total_calls: u64,
    /// Successful invocations.
    pub successful_calls: u64,
    /// Failed invocations.
    pub failed_calls: u64,
    /// Sum of all durations in milliseconds.
    pub total_duration_ms: u64,
    /// Smallest observed duration.
    pub min_duration_ms: u64,
    /// Largest observed duration.
    pub max_duration_ms: u64,
    /// Mean duration in milliseconds.
    pub average_duration_ms: f64,
    /// Successful calls as a percentage of all calls.
    pub success_rate: f64,
    /// Failure counts keyed by error kind.
    pub error_counts: BTreeMap<String, u64>,
    /// Unix milliseconds of the first call.
    pub first_call_ms: i64,
    /// Unix milliseconds of the latest call.
    pub last_call_ms: i64,
}

impl MetricsSnapshot {
    /// Returns a copy with averages and rates rounded to two decimals.
    #[must_use]
    pub fn rounded(mut self) -> Self {
        self.average_duration_ms = round2(self.average_duration_ms);
        self.success_rate = round2(self.success_rate);
        self
    }
}

/// Aggregate view across all components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    /// Components with at least one record.
    pub functions_with_metrics: usize,
    /// Sum of all calls.
    pub total_calls: u64,
    /// Sum of all successful calls.
    pub total_successful_calls: u64,
    /// Sum of all failed calls.
    pub total_failed_calls: u64,
    /// Overall success percentage, rounded to two decimals.
    pub overall_success_rate: f64,
    /// Mean of per-component success percentages, rounded to two decimals.
    pub average_success_rate: f64,
    /// Mean duration across all calls, rounded to two decimals.
    pub average_duration_ms: f64,
}

impl MetricsSummary {
    /// Aggregates a set of snapshots.
    #[must_use]
    pub fn from_snapshots<'a, I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = &'a MetricsSnapshot>,
    {
        let mut functions_with_metrics = 0_u64;
        let mut total_calls = 0;
        let mut total_successful_calls = 0;
        let mut total_failed_calls = 0;
        let mut total_duration_ms = 0u64;
        let mut rate_sum = 0.0;
        for snapshot in snapshots {
            functions_with_metrics += 1;
            rate_sum += snapshot.success_rate;
            total_calls += snapshot.total_calls;
            total_successful_calls += snapshot.successful_calls;
            total_failed_calls += snapshot.failed_calls;
            total_duration_ms = total_duration_ms.saturating_add(snapshot.total_duration_ms);
        }
        let average_success_rate = if functions_with_metrics == 0 {
            0.0
        } else {
            rate_sum / f64::from(u32::try_from(functions_with_metrics).unwrap_or(u32::MAX))
        };
        Self {
            functions_with_metrics: usize::try_from(functions_with_metrics).unwrap_or(usize::MAX),
            total_calls,
            total_successful_calls,
            total_failed_calls,
            overall_success_rate: round2(ratio(total_successful_calls, total_calls) * 100.0),
            average_success_rate: round2(average_success_rate),
            average_duration_ms: round2(ratio(total_duration_ms, total_calls)),
        }
    }
}

// ============================================================================
// SECTION: Tracker
// ============================================================================

/// Per-component metrics keyed by component key.
#[derive(Debug, Default)]
pub struct MetricsTracker {
    /// Records keyed by component key.
    records: DashMap<String, Arc<FunctionMetrics>>,
}

impl MetricsTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful invocation.
    pub fn record_success(&self, component: &str, duration_ms: u64) {
        self.record_for(component).record_success(duration_ms);
    }

    /// Records a failed invocation with its error kind.
    pub fn record_failure(&self, component: &str, duration_ms: u64, error_kind: &str) {
        self.record_for(component).record_failure(duration_ms, error_kind);
    }

    /// Returns a snapshot for one component.
    #[must_use]
    pub fn metrics_of(&self, component: &str) -> Option<MetricsSnapshot> {
        self.records.get(component).map(|record| record.snapshot())
    }

    /// Returns snapshots for every component.
    #[must_use]
    pub fn all_metrics(&self) -> BTreeMap<String, MetricsSnapshot> {
        self.records.iter().map(|entry| (entry.key().clone(), entry.value().snapshot())).collect()
    }

    /// Returns the aggregate summary across all components.
    #[must_use]
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary::from_snapshots(self.all_metrics().values())
    }

    /// Discards the record for one component.
    pub fn reset(&self, component: &str) {
        if self.records.remove(component).is_some() {
            debug!(component, "reset metrics");
        }
    }

    /// Discards every record.
    pub fn reset_all(&self) {
        self.records.clear();
        debug!("reset all metrics");
    }

    /// Returns the record for a component, creating it when absent.
    fn record_for(&self, component: &str) -> Arc<FunctionMetrics> {
        if let Some(record) = self.records.get(component) {
            return Arc::clone(record.value());
        }
        let record = self
            .records
            .entry(component.to_string())
            .or_insert_with(|| Arc::new(FunctionMetrics::new(component)));
        Arc::clone(record.value())
    }
}
