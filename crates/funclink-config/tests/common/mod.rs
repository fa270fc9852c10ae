// crates/funclink-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config loading tests.
// Purpose: Reduce duplication across integration tests for funclink-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Writes `content` to `funclink.toml` inside a fresh temp directory.
pub fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("funclink.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}
