// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Worker threads used by concurrency scenarios when not overridden.
pub const DEFAULT_CONCURRENCY: usize = 16;
/// Upper bound on the concurrency override.
pub const MAX_CONCURRENCY: usize = 512;

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Optional timeout override in seconds (positive integer).
    TimeoutSeconds,
    /// Optional worker count for concurrency scenarios.
    Concurrency,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TimeoutSeconds => "FUNCLINK_SYSTEM_TEST_TIMEOUT_SEC",
            Self::Concurrency => "FUNCLINK_SYSTEM_TEST_CONCURRENCY",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// Optional timeout override in seconds (positive integer).
    pub timeout: Option<Duration>,
    /// Optional worker count for concurrency scenarios.
    pub concurrency: Option<usize>,
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, a zero timeout or worker count).
    pub fn load() -> Result<Self, String> {
        let timeout = read_env_nonempty(SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        let concurrency = read_env_nonempty(SystemTestEnv::Concurrency.as_str())?
            .map(|value| parse_concurrency(SystemTestEnv::Concurrency.as_str(), &value))
            .transpose()?;
        Ok(Self {
            timeout,
            concurrency,
        })
    }

    /// Returns the worker count for concurrency scenarios.
    #[must_use]
    pub fn concurrency_or_default(&self) -> usize {
        self.concurrency.unwrap_or(DEFAULT_CONCURRENCY)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the environment variable is set but empty.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    let Some(value) = read_env_strict(name)? else {
        return Ok(None);
    };
    if value.trim().is_empty() {
        return Err(format!("{name} must not be empty"));
    }
    Ok(Some(value))
}

/// Parses a positive integer number of seconds.
///
/// # Errors
///
/// Returns an error when the value is not a positive integer.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a worker count within `1 ..= MAX_CONCURRENCY`.
///
/// # Errors
///
/// Returns an error when the value is not an integer in range.
fn parse_concurrency(name: &str, raw: &str) -> Result<usize, String> {
    let workers: usize =
        raw.trim().parse().map_err(|_| format!("{name} must be a positive integer"))?;
    if workers == 0 || workers > MAX_CONCURRENCY {
        return Err(format!("{name} must be between 1 and {MAX_CONCURRENCY}"));
    }
    Ok(workers)
}
