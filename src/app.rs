use std::io;

use anyhow::Result;
use tracing::instrument;

use crate::cli::{Args, Command, LogLevel, OutputFormat, SimulatorArgs};
use crate::telemetry;
use crate::terminal::{SystemTerminalClient, TerminalClient};

const SERVICE_NAME: &str = "pipstream";

/// Runs parsed CLI arguments against the process's real terminal.
///
/// ```
/// # async fn run() -> anyhow::Result<()> {
/// use clap::Parser;
///
/// let args = pipstream::Args::try_parse_from([
///     "pipstream",
///     "--output",
///     "json",
///     "--scan",
///     "7|Alpha",
///     "discover",
/// ])?;
/// let mut out = Vec::new();
/// pipstream::run(args, &mut out).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, the session rejects a
/// request, or output writing fails.
pub async fn run<W>(args: Args, out: &mut W) -> Result<()>
where
    W: io::Write,
{
    run_with_clients(args, out, &SystemTerminalClient).await
}

/// Runs parsed CLI arguments with an injected terminal client.
///
/// An explicit `--output` wins; otherwise output is pretty on a terminal and
/// JSON when stdout is redirected.
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, the session rejects a
/// request, or output writing fails.
pub async fn run_with_clients<W>(
    args: Args,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
) -> Result<()>
where
    W: io::Write,
{
    let log_level = args.log_level();
    let output_format = args.output_format().unwrap_or(if terminal_client.stdout_is_terminal() {
        OutputFormat::Pretty
    } else {
        OutputFormat::Json
    });
    let (command, simulator) = args.into_command_and_simulator();

    run_with_clients_and_log_level(
        command,
        simulator,
        out,
        terminal_client,
        output_format,
        log_level,
    )
    .await
}

/// Runs one command with every client and telemetry setting supplied.
///
/// ```
/// # async fn run() -> anyhow::Result<()> {
/// struct FakeTerminal;
/// impl pipstream::TerminalClient for FakeTerminal {
///     fn stdout_is_terminal(&self) -> bool { false }
///     fn stderr_is_terminal(&self) -> bool { false }
/// }
///
/// let simulator = pipstream::SimulatorArgs::builder()
///     .scan_fixture("7|Alpha")?
///     .samples("1:1,1:2")?
///     .build();
/// let mut out = Vec::new();
/// pipstream::run_with_clients_and_log_level(
///     pipstream::Command::Stream(pipstream::StreamArgs::new(std::num::NonZeroUsize::new(2))),
///     simulator,
///     &mut out,
///     &FakeTerminal,
///     pipstream::OutputFormat::Json,
///     Some(pipstream::LogLevel::Off),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, the session rejects a
/// request, or output writing fails.
#[instrument(
    skip(simulator, out, terminal_client),
    level = "info",
    fields(command = command.name(), ?output_format, ?log_level)
)]
pub async fn run_with_clients_and_log_level<W>(
    command: Command,
    simulator: SimulatorArgs,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
    output_format: OutputFormat,
    log_level: Option<LogLevel>,
) -> Result<()>
where
    W: io::Write,
{
    telemetry::initialise_tracing(
        SERVICE_NAME,
        terminal_client.stderr_is_terminal(),
        log_level.map(LogLevel::as_level_filter),
    )?;

    match command {
        Command::Discover(args) => {
            crate::cli::discover::run(simulator, &args, out, terminal_client, output_format).await
        }
        Command::Stream(args) => {
            crate::cli::stream::run(simulator, &args, out, terminal_client, output_format).await
        }
    }
}
