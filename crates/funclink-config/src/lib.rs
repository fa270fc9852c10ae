// crates/funclink-config/src/lib.rs
// ============================================================================
// Module: Funclink Config Library
// Description: Runtime configuration model, loading, and validation.
// Purpose: Single source of truth for funclink.toml semantics.
// Dependencies: funclink-core, funclink-remote, serde, toml
// ============================================================================

//! ## Overview
//! `funclink-config` defines the `funclink.toml` model. Loading enforces
//! size and path limits, validation fails closed on out-of-range values and
//! malformed endpoint URLs, and the loaded model converts into the settings
//! consumed by the call pipeline and the remote proxy.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
