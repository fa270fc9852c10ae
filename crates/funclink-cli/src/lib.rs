// crates/funclink-cli/src/lib.rs
// ============================================================================
// Module: Funclink CLI Library
// Description: Demo workflow and host wiring behind the `funclink` binary.
// Purpose: Keep business callables and pipeline assembly testable.
// Dependencies: funclink-core, funclink-config, funclink-remote
// ============================================================================

//! ## Overview
//! The `funclink` binary hosts a small order workflow on top of the call
//! pipeline. [`demo`] holds the business callables and their payload types;
//! [`host`] turns a loaded [`funclink_config::FunclinkConfig`] into a ready
//! pipeline with the demo registered and unconfigured keys proxied remotely.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod demo;
pub mod host;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use host::Host;
pub use host::HostError;
