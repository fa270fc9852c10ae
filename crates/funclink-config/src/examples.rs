// crates/funclink-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starting point for operators and tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for `funclink.toml`. The example validates as-is.

/// Returns a canonical example `funclink.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[security]
allow_unauthenticated_internal_calls = true
admin_role = "ADMIN"

[remote]
timeout_ms = 30000
max_response_bytes = 1048576
user_agent = "funclink/0.1"
env_prefix = "FUNCLINK_REMOTE_URL_"
load_env = true

[remote.endpoints]
# inventoryChecker = "https://inventory.example.com/invoke"

[logging]
filter = "info"

[functions.paymentProcessor]
name = "Payment Processor"

[functions.paymentProcessor.security]
group = "finance"
roles = ["PAYMENT", "ADMIN"]
authentication = "jwt"

[functions.paymentProcessor.deployment]
cloud = "aws"
memory = "512MB"
timeout = "30s"
"#,
    )
}
