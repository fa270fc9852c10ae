// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for Funclink system-tests.
// Purpose: Provide stub endpoints, pipeline harnesses, and timeout policy.
// Dependencies: system-tests, funclink-core, funclink-remote, tiny_http
// ============================================================================

//! ## Overview
//! Shared helpers for Funclink system-tests.
//! Invariants:
//! - Stub endpoints bind loopback ports only and stop when dropped.
//! - Scenarios never depend on external services.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod harness;
pub mod stub;
pub mod timeouts;
