// system-tests/tests/helpers/timeouts.rs
// ============================================================================
// Module: System Test Timeouts
// Description: Centralized timeout configuration with env overrides.
// Purpose: Keep system-test timeouts consistent and configurable across suites.
// ============================================================================

use std::time::Duration;

use system_tests::config::SystemTestConfig;

/// Loads the system-test config, failing the test on invalid overrides.
pub fn system_config() -> SystemTestConfig {
    SystemTestConfig::load().unwrap_or_else(|err| panic!("invalid system-test env: {err}"))
}

/// Returns the effective timeout, honoring `FUNCLINK_SYSTEM_TEST_TIMEOUT_SEC` when set.
/// The override acts as a minimum to avoid shortening explicitly longer test timeouts.
#[must_use]
pub fn resolve_timeout(requested: Duration) -> Duration {
    system_config().timeout.map_or(requested, |override_timeout| requested.max(override_timeout))
}

/// Proxy timeout in milliseconds for scenarios that expect a response.
#[must_use]
pub fn proxy_timeout_ms() -> u64 {
    u64::try_from(resolve_timeout(Duration::from_secs(5)).as_millis()).unwrap_or(u64::MAX)
}
