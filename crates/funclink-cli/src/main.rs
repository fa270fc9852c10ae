// crates/funclink-cli/src/main.rs
// ============================================================================
// Module: Funclink CLI Entry Point
// Description: Command dispatcher for the demo host and its discovery views.
// Purpose: Invoke components and inspect the catalog, metrics, and health.
// Dependencies: clap, funclink-cli, funclink-config, funclink-core, serde,
// serde_json, thiserror, tracing-subscriber
// ============================================================================

//! ## Overview
//! The `funclink` binary loads `funclink.toml`, assembles the demo [`Host`],
//! and runs one command. Command results are JSON on stdout; logs go to
//! stderr through a `tracing-subscriber` formatter so stdout stays
//! machine-readable. Inputs are untrusted: input files are read with a hard
//! size limit and JSON is parsed before any call is made.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use funclink_cli::Host;
use funclink_config::FunclinkConfig;
use funclink_config::config_toml_example;
use funclink_core::SecurityContext;
use funclink_core::surface::DependencyReport;
use funclink_core::surface::MetricsReport;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of an `--input-file` payload.
const MAX_INPUT_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "funclink", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (overrides `FUNCLINK_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Invoke a component through the pipeline.
    Invoke(InvokeCommand),
    /// List registered functions with metrics and dependency digests.
    Functions,
    /// Show one function's metadata, metrics, and dependencies.
    Describe(DescribeCommand),
    /// Print the health summary.
    Health,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `invoke`.
#[derive(Args, Debug)]
struct InvokeCommand {
    /// Component key to call.
    component: String,
    /// JSON input document.
    #[arg(long, value_name = "JSON", default_value = "{}", conflicts_with = "input_file")]
    input: String,
    /// Read the JSON input from a file instead.
    #[arg(long, value_name = "PATH")]
    input_file: Option<PathBuf>,
    /// Caller user id; omit for an internal call.
    #[arg(long, value_name = "USER")]
    user: Option<String>,
    /// Caller role (repeatable).
    #[arg(long = "role", value_name = "ROLE", requires = "user")]
    roles: Vec<String>,
    /// Caller security group.
    #[arg(long, value_name = "GROUP", requires = "user")]
    group: Option<String>,
    /// Append metrics and dependency reports to the output.
    #[arg(long)]
    report: bool,
}

/// Arguments for `describe`.
#[derive(Args, Debug)]
struct DescribeCommand {
    /// Component key to describe.
    component: String,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the config file.
    Check,
    /// Print an annotated example config.
    Example,
}

/// Output of `invoke --report`.
#[derive(Debug, Serialize)]
struct InvokeReport {
    /// Value returned by the component.
    output: Value,
    /// Metrics after the call.
    metrics: MetricsReport,
    /// Dependency graph after the call.
    dependencies: DependencyReport,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let Cli {
        config,
        command,
    } = Cli::parse();
    let config_path = config.as_deref();
    match command {
        Commands::Invoke(command) => command_invoke(&start_host(config_path)?, command),
        Commands::Functions => write_json(&start_host(config_path)?.discovery().catalog()),
        Commands::Describe(command) => command_describe(&start_host(config_path)?, &command),
        Commands::Health => write_json(&start_host(config_path)?.discovery().health()),
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Check => command_config_check(config_path),
            ConfigCommand::Example => command_config_example(),
        },
    }
}

/// Loads config, installs logging, and assembles the demo host.
fn start_host(config_path: Option<&Path>) -> CliResult<Host> {
    let config = load_config(config_path)?;
    init_tracing(&config.logging.filter)?;
    Host::from_config(&config).map_err(|err| CliError::new(format!("failed to start host: {err}")))
}

/// Loads the runtime config.
fn load_config(path: Option<&Path>) -> CliResult<FunclinkConfig> {
    FunclinkConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the config filter.
fn init_tracing(filter: &str) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .map_err(|err| CliError::new(format!("invalid log filter: {err}")))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| CliError::new(format!("failed to install logger: {err}")))
}

// ============================================================================
// SECTION: Invoke Command
// ============================================================================

/// Executes `invoke`.
fn command_invoke(host: &Host, command: InvokeCommand) -> CliResult<ExitCode> {
    let input = read_input(&command)?;
    let identity = command
        .user
        .map(|user| SecurityContext::new(user, command.roles, command.group));
    match host.invoke(identity, &command.component, input) {
        Ok(output) if command.report => {
            let discovery = host.discovery();
            write_json(&InvokeReport {
                output,
                metrics: discovery.metrics(),
                dependencies: discovery.dependencies(),
            })
        }
        Ok(output) => write_json(&output),
        Err(response) => {
            write_json(&response)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Parses the invocation input from `--input` or `--input-file`.
fn read_input(command: &InvokeCommand) -> CliResult<Value> {
    match &command.input_file {
        Some(path) => {
            let bytes = read_bytes_with_limit(path, MAX_INPUT_BYTES).map_err(|err| match err {
                ReadLimitError::Io(err) => CliError::new(format!(
                    "failed to read input file {}: {err}",
                    path.display()
                )),
                ReadLimitError::TooLarge {
                    size,
                    limit,
                } => CliError::new(format!(
                    "input file {} is {size} bytes; limit is {limit}",
                    path.display()
                )),
            })?;
            serde_json::from_slice(&bytes)
                .map_err(|err| CliError::new(format!("invalid input JSON: {err}")))
        }
        None => serde_json::from_str(&command.input)
            .map_err(|err| CliError::new(format!("invalid input JSON: {err}"))),
    }
}

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Discovery Commands
// ============================================================================

/// Executes `describe`.
fn command_describe(host: &Host, command: &DescribeCommand) -> CliResult<ExitCode> {
    let detail = host
        .discovery()
        .describe(&command.component)
        .ok_or_else(|| CliError::new(format!("function not found: {}", command.component)))?;
    write_json(&detail)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes `config check`.
fn command_config_check(path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(path)?;
    let source = config
        .source_path
        .as_ref()
        .map_or_else(|| "defaults".to_string(), |path| path.display().to_string());
    write_stdout_line(&format!("config ok ({source})"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config example`.
fn command_config_example() -> CliResult<ExitCode> {
    write_stdout_line(config_toml_example().trim_end())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a value as pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<ExitCode> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render output: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
