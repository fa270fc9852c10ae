// crates/funclink-core/src/trace.rs
// ============================================================================
// Module: Trace Identifiers
// Description: Short trace identifiers for error responses.
// Purpose: Let operators correlate a reported failure with its log line.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Trace identifiers are eight lowercase hex characters. Each generator mixes
//! a boot-scoped random seed with a monotonic counter, so identifiers from one
//! generator never repeat until the counter wraps the 32-bit space.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;

/// Length of issued trace identifiers.
pub const TRACE_ID_LENGTH: usize = 8;

/// Boot-scoped trace identifier generator.
///
/// # Invariants
/// - Issued identifiers are exactly [`TRACE_ID_LENGTH`] hex characters.
#[derive(Debug)]
pub struct TraceIdGenerator {
    /// Random seed mixed into every identifier.
    seed: u32,
    /// Monotonic counter for identifiers issued by this generator.
    counter: AtomicU64,
}

impl TraceIdGenerator {
    /// Creates a generator with a fresh random seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seed: OsRng.next_u32(),
            counter: AtomicU64::new(0),
        }
    }

    /// Issues a new trace identifier.
    #[must_use]
    pub fn issue(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let low = u32::try_from(seq & u64::from(u32::MAX)).unwrap_or(0);
        format!("{:08x}", self.seed.wrapping_add(low.wrapping_mul(0x9e37_79b9)))
    }
}

impl Default for TraceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
