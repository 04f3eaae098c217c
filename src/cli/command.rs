use std::time::Duration;

use bon::Builder;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::cli::discover::DiscoverArgs;
use crate::cli::stream::StreamArgs;
use crate::error::FixtureError;
use crate::session::TransportStatus;
use crate::transport::{SampleFixture, ScanFixture, SimulatorConfig};

/// Command-line options for the PIP session tool.
#[derive(Debug, Parser)]
#[command(
    name = "pipstream",
    about = "Discover, connect to, and stream from a simulated PIP biosensor."
)]
pub struct Args {
    /// Overrides `RUST_LOG` with a single log level.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
    /// Output format. Defaults to `pretty` on a terminal and `json` otherwise.
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,
    /// Simulated scan results in the form `id|name;...` (`-` for an unnamed device).
    /// Defaults to a single device, `1|PIP`.
    #[arg(long, global = true)]
    scan: Option<ScanFixture>,
    /// Simulated analyzer samples in the form `active:trend,...` (e.g. `1:1,0:2`).
    #[arg(long, global = true)]
    samples: Option<SampleFixture>,
    /// Delay between simulated samples (e.g. `250ms`).
    #[arg(long, global = true, value_parser = parse_duration)]
    sample_interval: Option<Duration>,
    /// Delay before each simulated device is advertised (e.g. `1s`).
    #[arg(long, global = true, value_parser = parse_duration)]
    discovery_delay: Option<Duration>,
    /// Status code the simulated device answers connection requests with.
    #[arg(long, global = true, allow_negative_numbers = true)]
    connect_status: Option<i32>,
    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// Creates argument values directly without CLI parsing.
    ///
    /// ```
    /// use pipstream::{Args, Command, DiscoverArgs};
    ///
    /// let args = Args::new(Command::Discover(DiscoverArgs::default()));
    /// let _ = args;
    /// ```
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            log_level: None,
            output: None,
            scan: None,
            samples: None,
            sample_interval: None,
            discovery_delay: None,
            connect_status: None,
            command,
        }
    }

    /// Replaces the simulated device settings.
    #[must_use]
    pub fn with_simulator(mut self, simulator: SimulatorArgs) -> Self {
        let SimulatorArgs {
            scan_fixture,
            samples,
            sample_interval,
            discovery_delay,
            connect_status,
        } = simulator;

        self.scan = Some(scan_fixture);
        self.samples = samples;
        self.sample_interval = sample_interval;
        self.discovery_delay = discovery_delay;
        self.connect_status = connect_status;
        self
    }

    /// Sets the output format instead of detecting it from the terminal.
    #[must_use]
    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = Some(output);
        self
    }

    #[must_use]
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    #[must_use]
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output
    }

    /// Splits parsed arguments into the command and its simulator settings.
    #[must_use]
    pub fn into_command_and_simulator(self) -> (Command, SimulatorArgs) {
        let Args {
            scan,
            samples,
            sample_interval,
            discovery_delay,
            connect_status,
            command,
            ..
        } = self;

        let simulator = SimulatorArgs {
            scan_fixture: scan.unwrap_or_default(),
            samples,
            sample_interval,
            discovery_delay,
            connect_status,
        };
        (command, simulator)
    }
}

/// Simulated device settings for programmatic runs.
///
/// ```
/// # fn main() -> Result<(), pipstream::FixtureError> {
/// let simulator = pipstream::SimulatorArgs::builder()
///     .scan_fixture("7|Alpha;9|-")?
///     .samples("1:1,1:2")?
///     .build();
/// # let _ = simulator;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Builder)]
pub struct SimulatorArgs {
    #[builder(with = |value: &str| -> std::result::Result<_, FixtureError> { value.parse() })]
    scan_fixture: ScanFixture,
    #[builder(with = |value: &str| -> std::result::Result<_, FixtureError> { value.parse() })]
    samples: Option<SampleFixture>,
    sample_interval: Option<Duration>,
    discovery_delay: Option<Duration>,
    connect_status: Option<i32>,
}

impl SimulatorArgs {
    pub(crate) fn into_simulator_config(self) -> SimulatorConfig {
        let Self {
            scan_fixture,
            samples,
            sample_interval,
            discovery_delay,
            connect_status,
        } = self;

        SimulatorConfig::builder()
            .scan_fixture(scan_fixture)
            .maybe_samples(samples)
            .maybe_sample_interval(sample_interval)
            .maybe_discovery_delay(discovery_delay)
            .maybe_connect_status(connect_status.map(TransportStatus::new))
            .build()
    }
}

/// Supported CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan for PIP devices and print what was found.
    Discover(DiscoverArgs),
    /// Discover, connect to the first PIP found, and print classified trend samples.
    Stream(StreamArgs),
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::Discover(_args) => "discover",
            Command::Stream(_args) => "stream",
        }
    }
}

/// Log level accepted by `--log-level`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    #[must_use]
    pub fn as_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable status lines and tables.
    Pretty,
    /// One JSON object per line.
    Json,
}

pub(crate) fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::session::DeviceInfo;

    #[test]
    fn scan_fixture_defaults_to_one_device() {
        let args = Args::try_parse_from(["pipstream", "discover"]).expect("defaults should parse");

        let (command, simulator) = args.into_command_and_simulator();
        assert_matches!(command, Command::Discover(_));
        let devices: Vec<DeviceInfo> = simulator.scan_fixture.into();
        assert_eq!(1, devices.len());
        assert_eq!(Some("PIP"), devices[0].name());
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let args = Args::try_parse_from([
            "pipstream",
            "stream",
            "--scan",
            "7|Alpha",
            "--connect-status",
            "-3",
            "--output",
            "json",
        ])
        .expect("global flags should parse after the subcommand");

        assert_eq!(Some(OutputFormat::Json), args.output_format());
        let (_command, simulator) = args.into_command_and_simulator();
        assert_eq!(Some(-3), simulator.connect_status);
    }

    #[test]
    fn malformed_scan_fixture_is_a_value_error() {
        let error = Args::try_parse_from(["pipstream", "--scan", "7", "discover"])
            .expect_err("a record without a name field should be rejected");

        assert_eq!(ErrorKind::ValueValidation, error.kind());
    }

    #[test]
    fn zero_sample_limit_is_rejected() {
        let error = Args::try_parse_from(["pipstream", "stream", "--max-samples", "0"])
            .expect_err("a zero sample limit should be rejected");

        assert_eq!(ErrorKind::ValueValidation, error.kind());
        assert!(
            Args::try_parse_from(["pipstream", "stream", "--max-samples", "1"]).is_ok()
        );
    }

    #[test]
    fn durations_use_humantime_syntax() {
        let args = Args::try_parse_from(["pipstream", "--sample-interval", "1s 500ms", "discover"])
            .expect("humantime duration should parse");

        let (_command, simulator) = args.into_command_and_simulator();
        assert_eq!(Some(Duration::from_millis(1500)), simulator.sample_interval);
    }

    #[test]
    fn subcommand_is_required() {
        let result = Args::try_parse_from(["pipstream", "--output", "json"]);

        assert_matches!(result, Err(_));
    }

    #[test]
    fn log_level_maps_to_level_filter() {
        let args = Args::try_parse_from(["pipstream", "--log-level", "debug", "discover"])
            .expect("log level should parse");

        assert_eq!(
            Some(LevelFilter::DEBUG),
            args.log_level().map(LogLevel::as_level_filter)
        );
    }
}
