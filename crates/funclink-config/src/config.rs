// crates/funclink-config/src/config.rs
// ============================================================================
// Module: Funclink Configuration
// Description: Configuration loading and validation for funclink hosts.
// Purpose: Provide strict config parsing with hard limits and safe defaults.
// Dependencies: funclink-core, funclink-remote, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `FUNCLINK_CONFIG`, then
//! `funclink.toml` in the working directory. Only the last fallback may be
//! absent; an absent default file yields the default configuration.
//!
//! Remote endpoints come from the `[remote.endpoints]` table and, when
//! `remote.load_env` is set, from environment entries named
//! `<remote.env_prefix><component>`. Environment entries override the file.
//!
//! `[functions.<component>]` tables override the name, security policy, and
//! deployment hints of callables the host registers. For components served
//! by a remote endpoint the same table becomes the metadata the proxy is
//! invoked under, so access checks do not depend on placement.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use funclink_core::DeploymentHints;
use funclink_core::FunctionMetadata;
use funclink_core::FunctionRegistration;
use funclink_core::PipelineSettings;
use funclink_core::SecurityPolicy;
use funclink_remote::DEFAULT_ENV_PREFIX;
use funclink_remote::RemoteEndpoint;
use funclink_remote::RemoteEndpoints;
use funclink_remote::RemoteProxyConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub(crate) const DEFAULT_CONFIG_NAME: &str = "funclink.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "FUNCLINK_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum remote request timeout in milliseconds.
pub(crate) const MIN_REMOTE_TIMEOUT_MS: u64 = 100;
/// Maximum remote request timeout in milliseconds.
pub(crate) const MAX_REMOTE_TIMEOUT_MS: u64 = 300_000;
/// Default remote request timeout in milliseconds.
pub(crate) const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 30_000;
/// Default remote response size limit in bytes.
pub(crate) const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;
/// Hard ceiling for the remote response size limit.
pub(crate) const MAX_RESPONSE_BYTES_LIMIT: usize = 64 * 1024 * 1024;
/// Maximum number of configured remote endpoints.
pub(crate) const MAX_REMOTE_ENDPOINTS: usize = 1024;
/// Maximum length of the admin role name.
pub(crate) const MAX_ROLE_NAME_LENGTH: usize = 128;
/// Maximum length of the user agent string.
pub(crate) const MAX_USER_AGENT_LENGTH: usize = 256;
/// Maximum number of `[functions]` entries.
pub(crate) const MAX_FUNCTION_ENTRIES: usize = 1024;
/// Maximum number of roles in one function policy.
pub(crate) const MAX_FUNCTION_ROLES: usize = 64;

// ============================================================================
// SECTION: Top-Level Config
// ============================================================================

/// Root `funclink.toml` model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunclinkConfig {
    /// Access-check settings.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Remote proxy settings and endpoints.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Log filter settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-function metadata overrides keyed by component.
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionConfig>,
    /// File the configuration was read from; `None` for defaults.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl FunclinkConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let source = resolve_path(path, env::var(CONFIG_ENV_VAR).ok())?;
        Self::load_source(&source)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a resolved source, tolerating an absent default file.
    pub(crate) fn load_source(source: &ConfigSource) -> Result<Self, ConfigError> {
        validate_path(&source.path)?;
        if !source.explicit && !source.path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&source.path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source_path = Some(source.path.clone());
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.security.validate()?;
        self.remote.validate()?;
        self.logging.validate()?;
        if self.functions.len() > MAX_FUNCTION_ENTRIES {
            return Err(ConfigError::Invalid("too many functions entries".to_string()));
        }
        for (component, function) in &self.functions {
            function.validate(component)?;
        }
        Ok(())
    }

    /// Applies the `[functions.<component>]` override, if any, to a
    /// registration.
    #[must_use]
    pub fn apply_function_overrides(
        &self,
        registration: FunctionRegistration,
    ) -> FunctionRegistration {
        match self.functions.get(registration.component()) {
            Some(function) => function.apply(registration),
            None => registration,
        }
    }

    /// Returns the pipeline security settings.
    #[must_use]
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            allow_unauthenticated_internal_calls: self.security.allow_unauthenticated_internal_calls,
            admin_role: self.security.admin_role.clone(),
        }
    }

    /// Returns the remote proxy limits.
    #[must_use]
    pub fn proxy_config(&self) -> RemoteProxyConfig {
        RemoteProxyConfig {
            timeout_ms: self.remote.timeout_ms,
            max_response_bytes: self.remote.max_response_bytes,
            user_agent: self.remote.user_agent.clone(),
        }
    }

    /// Builds the endpoint table from the file and, when enabled, the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a file endpoint is invalid.
    pub fn remote_endpoints(&self) -> Result<RemoteEndpoints, ConfigError> {
        if self.remote.load_env {
            self.remote_endpoints_with_vars(env::vars())
        } else {
            self.remote_endpoints_with_vars(std::iter::empty::<(String, String)>())
        }
    }

    /// Builds the endpoint table from the file plus the given variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a file endpoint is invalid.
    pub fn remote_endpoints_with_vars<I, K, V>(
        &self,
        vars: I,
    ) -> Result<RemoteEndpoints, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let endpoints = RemoteEndpoints::new();
        for (component, url) in &self.remote.endpoints {
            endpoints.insert(parse_endpoint(component, url)?);
        }
        endpoints.load_vars(&self.remote.env_prefix, vars);
        for (component, function) in &self.functions {
            if let Some(endpoint) = endpoints.get(component) {
                endpoints.describe(function.metadata(&endpoint.component));
            }
        }
        Ok(endpoints)
    }
}

// ============================================================================
// SECTION: Security Config
// ============================================================================

/// `[security]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Allow calls that carry no caller identity.
    #[serde(default = "default_allow_unauthenticated")]
    pub allow_unauthenticated_internal_calls: bool,
    /// Role that bypasses group and role checks.
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allow_unauthenticated_internal_calls: default_allow_unauthenticated(),
            admin_role: default_admin_role(),
        }
    }
}

impl SecurityConfig {
    /// Validates access-check settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let role = self.admin_role.trim();
        if role.is_empty() {
            return Err(ConfigError::Invalid("security.admin_role must be non-empty".to_string()));
        }
        if role.len() > MAX_ROLE_NAME_LENGTH {
            return Err(ConfigError::Invalid("security.admin_role exceeds max length".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Remote Config
// ============================================================================

/// `[remote]` section.
///
/// # Invariants
/// - `timeout_ms` lies in `100 ..= 300000`.
/// - Every entry in `endpoints` is an `http`/`https` URL without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// User agent for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Environment prefix for endpoint entries.
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,
    /// Read endpoint entries from the process environment.
    #[serde(default = "default_load_env")]
    pub load_env: bool,
    /// Component-to-URL entries.
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_remote_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            user_agent: default_user_agent(),
            env_prefix: default_env_prefix(),
            load_env: default_load_env(),
            endpoints: BTreeMap::new(),
        }
    }
}

impl RemoteConfig {
    /// Validates remote proxy settings and endpoint URLs.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < MIN_REMOTE_TIMEOUT_MS || self.timeout_ms > MAX_REMOTE_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "remote.timeout_ms must be between {MIN_REMOTE_TIMEOUT_MS} and \
                 {MAX_REMOTE_TIMEOUT_MS}",
            )));
        }
        if self.max_response_bytes == 0 {
            return Err(ConfigError::Invalid(
                "remote.max_response_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_response_bytes > MAX_RESPONSE_BYTES_LIMIT {
            return Err(ConfigError::Invalid("remote.max_response_bytes too large".to_string()));
        }
        let agent = self.user_agent.trim();
        if agent.is_empty() || agent.len() > MAX_USER_AGENT_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "remote.user_agent must be 1 to {MAX_USER_AGENT_LENGTH} characters"
            )));
        }
        if self.env_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("remote.env_prefix must be non-empty".to_string()));
        }
        if self.endpoints.len() > MAX_REMOTE_ENDPOINTS {
            return Err(ConfigError::Invalid("too many remote.endpoints entries".to_string()));
        }
        for (component, url) in &self.endpoints {
            parse_endpoint(component, url)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Function Config
// ============================================================================

/// `[functions.<component>]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfig {
    /// Display name override.
    #[serde(default)]
    pub name: Option<String>,
    /// Security policy replacing the registered one.
    #[serde(default)]
    pub security: Option<SecurityPolicy>,
    /// Deployment hints replacing the registered ones.
    #[serde(default)]
    pub deployment: Option<DeploymentHints>,
}

impl FunctionConfig {
    /// Validates one function entry.
    fn validate(&self, component: &str) -> Result<(), ConfigError> {
        if component.trim().is_empty() {
            return Err(ConfigError::Invalid("functions keys must be non-empty".to_string()));
        }
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("functions.{component}.name must be non-empty")));
        }
        let Some(security) = &self.security else {
            return Ok(());
        };
        if security.group.as_deref().is_some_and(|group| group.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "functions.{component}.security.group must be non-empty"
            )));
        }
        if security.roles.len() > MAX_FUNCTION_ROLES {
            return Err(ConfigError::Invalid(format!(
                "functions.{component}.security.roles exceeds {MAX_FUNCTION_ROLES} entries"
            )));
        }
        if security.roles.iter().any(|role| role.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "functions.{component}.security.roles must not contain empty names"
            )));
        }
        Ok(())
    }

    /// Builds metadata for a component served only by a remote endpoint.
    fn metadata(&self, component: &str) -> FunctionMetadata {
        let mut metadata = FunctionMetadata::new(
            self.name.clone().unwrap_or_else(|| component.to_string()),
            component,
        );
        metadata.security.clone_from(&self.security);
        metadata.deployment.clone_from(&self.deployment);
        metadata
    }

    /// Merges this entry into a registration.
    fn apply(&self, mut registration: FunctionRegistration) -> FunctionRegistration {
        if let Some(name) = &self.name {
            registration = registration.named(name.clone());
        }
        if let Some(security) = &self.security {
            registration = registration.security(security.clone());
        }
        if let Some(deployment) = &self.deployment {
            registration = registration.deployment(deployment.clone());
        }
        registration
    }
}

// ============================================================================
// SECTION: Logging Config
// ============================================================================

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridable by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl LoggingConfig {
    /// Validates log settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolved config location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigSource {
    /// Path to read.
    pub(crate) path: PathBuf,
    /// True when the path was requested rather than defaulted.
    pub(crate) explicit: bool,
}

/// Resolves the config path from the caller or environment defaults.
pub(crate) fn resolve_path(
    path: Option<&Path>,
    env_path: Option<String>,
) -> Result<ConfigSource, ConfigError> {
    if let Some(path) = path {
        return Ok(ConfigSource {
            path: path.to_path_buf(),
            explicit: true,
        });
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ConfigSource {
            path: PathBuf::from(env_path),
            explicit: true,
        });
    }
    Ok(ConfigSource {
        path: PathBuf::from(DEFAULT_CONFIG_NAME),
        explicit: false,
    })
}

/// Validates the resolved path against security limits.
pub(crate) fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Parses one `[remote.endpoints]` entry.
fn parse_endpoint(component: &str, url: &str) -> Result<RemoteEndpoint, ConfigError> {
    RemoteEndpoint::parse(component, url)
        .map_err(|err| ConfigError::Invalid(format!("remote.endpoints.{component}: {err}")))
}

/// Default for `security.allow_unauthenticated_internal_calls`.
const fn default_allow_unauthenticated() -> bool {
    true
}

/// Default for `security.admin_role`.
fn default_admin_role() -> String {
    funclink_core::security::DEFAULT_ADMIN_ROLE.to_string()
}

/// Default for `remote.timeout_ms`.
const fn default_remote_timeout_ms() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_MS
}

/// Default for `remote.max_response_bytes`.
const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

/// Default for `remote.user_agent`.
fn default_user_agent() -> String {
    RemoteProxyConfig::default().user_agent
}

/// Default for `remote.env_prefix`.
fn default_env_prefix() -> String {
    DEFAULT_ENV_PREFIX.to_string()
}

/// Default for `remote.load_env`.
const fn default_load_env() -> bool {
    true
}

/// Default for `logging.filter`.
fn default_log_filter() -> String {
    "info".to_string()
}
