// crates/funclink-core/src/time.rs
// ============================================================================
// Module: Wall Clock
// Description: Unix millisecond timestamps for metrics and reports.
// Purpose: Centralize wall-clock reads behind one helper.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Wall-clock helpers. Durations are measured with [`std::time::Instant`];
//! this module only provides calendar timestamps for records and reports.

use time::OffsetDateTime;

/// Returns the current Unix time in milliseconds.
#[must_use]
pub fn now_unix_millis() -> i64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}
