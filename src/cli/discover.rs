use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio_stream::StreamExt;

use crate::config::SessionConfig;
use crate::error::CliConfigError;
use crate::session::{DiscoveryPolicy, SessionEvent, SessionEvents, start_session};
use crate::terminal::TerminalClient;
use crate::transport::SimulatedTransport;

use super::command::{OutputFormat, SimulatorArgs, parse_duration};
use super::output::Reporter;

/// Arguments shared by every command that runs discovery.
#[derive(Debug, Default, Args)]
pub struct DiscoverArgs {
    /// Keep scanning after the first PIP and report every device found.
    #[arg(long)]
    exhaustive: bool,
    /// Stop scanning after this long (e.g. `5s`).
    #[arg(long, value_parser = parse_duration)]
    discovery_timeout: Option<Duration>,
}

impl DiscoverArgs {
    /// Creates discovery arguments that stop at the first device.
    #[must_use]
    pub fn first_match() -> Self {
        Self::default()
    }

    /// Creates discovery arguments that collect every advertised device.
    #[must_use]
    pub fn exhaustive() -> Self {
        Self {
            exhaustive: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = Some(timeout);
        self
    }

    pub(crate) fn policy(&self) -> DiscoveryPolicy {
        if self.exhaustive {
            DiscoveryPolicy::Exhaustive
        } else {
            DiscoveryPolicy::FirstMatch
        }
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.discovery_timeout
    }
}

/// Executes the `discover` command.
pub(crate) async fn run<W>(
    simulator: SimulatorArgs,
    args: &DiscoverArgs,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    let mut reporter = Reporter::new(out, output_format, terminal_client);
    let config = SessionConfig::builder()
        .discovery_policy(args.policy())
        .maybe_discovery_timeout(args.timeout())
        .build();
    let transport_config = simulator.into_simulator_config();
    let (session, mut events) = start_session(config, |sender| {
        SimulatedTransport::new(transport_config, sender)
    });

    let result = async {
        session.begin_discovery().await?;
        await_discovery(&mut events, &mut reporter).await?;
        let snapshot = session.snapshot().await?;
        Ok::<_, anyhow::Error>(snapshot)
    }
    .await;
    session.shutdown();

    reporter.devices(&result?)
}

/// Reports session events until the running scan completes.
///
/// Returns whether any device was discovered.
pub(crate) async fn await_discovery<W>(
    events: &mut SessionEvents,
    reporter: &mut Reporter<'_, W>,
) -> Result<bool>
where
    W: io::Write,
{
    while let Some(event) = events.next().await {
        reporter.event(&event)?;
        if let SessionEvent::DiscoveryComplete { found } = event {
            return Ok(found);
        }
    }
    Err(CliConfigError::EventStreamClosed.into())
}
