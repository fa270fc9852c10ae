// system-tests/src/lib.rs
// ============================================================================
// Module: Funclink System Tests Library
// Description: Shared configuration for system test scenarios.
// Purpose: Provide common settings for the Funclink system-test binaries.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration used by the Funclink system-test
//! binaries in `system-tests/tests`. Scenarios exercise the full stack: the
//! demo host, the call pipeline, and the remote proxy against local stub
//! HTTP servers.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
