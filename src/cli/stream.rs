use std::io;
use std::num::NonZeroUsize;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Args;
use serde::Serialize;
use strum_macros::Display;
use tokio_stream::StreamExt;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::CliConfigError;
use crate::session::{
    DeviceInfo, SessionEvent, SessionEvents, SessionHandle, TrendState, start_session,
};
use crate::terminal::TerminalClient;
use crate::transport::SimulatedTransport;

use super::command::{OutputFormat, SimulatorArgs, parse_duration};
use super::discover::{DiscoverArgs, await_discovery};
use super::output::Reporter;

/// Arguments for the `stream` command.
#[derive(Debug, Default, Args)]
pub struct StreamArgs {
    #[command(flatten)]
    discovery: DiscoverArgs,
    /// Disconnect after this many trend samples. If omitted, stream until Ctrl+C.
    #[arg(long)]
    max_samples: Option<NonZeroUsize>,
    /// Give up on a connection attempt after this long (e.g. `10s`).
    #[arg(long, value_parser = parse_duration)]
    connect_timeout: Option<Duration>,
}

impl StreamArgs {
    /// Creates stream arguments with an optional sample limit.
    #[must_use]
    pub fn new(max_samples: Option<NonZeroUsize>) -> Self {
        Self {
            max_samples,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::builder()
            .discovery_policy(self.discovery.policy())
            .maybe_discovery_timeout(self.discovery.timeout())
            .maybe_connect_timeout(self.connect_timeout)
            .build()
    }
}

/// Caller-side count of classified samples.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub(crate) struct TrendTally {
    relaxing: usize,
    stressing: usize,
    steady: usize,
    inactive: usize,
}

impl TrendTally {
    pub(crate) fn record(&mut self, state: TrendState) {
        *self.slot(state) += 1;
    }

    pub(crate) fn count(&self, state: TrendState) -> usize {
        match state {
            TrendState::Relaxing => self.relaxing,
            TrendState::Stressing => self.stressing,
            TrendState::Steady => self.steady,
            TrendState::Inactive => self.inactive,
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.relaxing + self.stressing + self.steady + self.inactive
    }

    fn slot(&mut self, state: TrendState) -> &mut usize {
        match state {
            TrendState::Relaxing => &mut self.relaxing,
            TrendState::Stressing => &mut self.stressing,
            TrendState::Steady => &mut self.steady,
            TrendState::Inactive => &mut self.inactive,
        }
    }
}

/// Why a stream run ended.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum StreamStopReason {
    #[strum(to_string = "sample limit reached")]
    SampleLimit,
    #[strum(to_string = "interrupted")]
    Interrupted,
    #[strum(to_string = "device disconnected")]
    DeviceDisconnected,
}

/// Final report of a `stream` run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename = "summary")]
pub(crate) struct StreamSummary {
    pub(crate) device: DeviceInfo,
    pub(crate) samples: usize,
    pub(crate) tally: TrendTally,
    pub(crate) stop_reason: StreamStopReason,
}

/// Executes the `stream` command.
pub(crate) async fn run<W>(
    simulator: SimulatorArgs,
    args: &StreamArgs,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    let mut reporter = Reporter::new(out, output_format, terminal_client);
    let transport_config = simulator.into_simulator_config();
    let (session, mut events) = start_session(args.session_config(), |sender| {
        SimulatedTransport::new(transport_config, sender)
    });

    let result = stream_samples(&session, &mut events, args.max_samples, &mut reporter).await;
    session.shutdown();

    let summary = result?;
    info!(samples = summary.samples, stop_reason = %summary.stop_reason, "stream finished");
    reporter.summary(&summary)
}

async fn stream_samples<W>(
    session: &SessionHandle,
    events: &mut SessionEvents,
    max_samples: Option<NonZeroUsize>,
    reporter: &mut Reporter<'_, W>,
) -> Result<StreamSummary>
where
    W: io::Write,
{
    session.begin_discovery().await?;
    await_discovery(events, reporter).await?;

    let device = session.connect_to_discovered().await?;
    reporter.progress(&format!("Connecting to {}...", device.display_name()))?;

    let mut tally = TrendTally::default();
    let mut stopping: Option<StreamStopReason> = None;

    let stop_reason = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c(), if stopping.is_none() => {
                signal.map_err(|source| CliConfigError::CtrlC { source })?;
                stopping = Some(StreamStopReason::Interrupted);
                if !request_disconnect(session, reporter).await? {
                    break StreamStopReason::Interrupted;
                }
            }
            maybe_event = events.next() => {
                let Some(event) = maybe_event else {
                    return Err(CliConfigError::EventStreamClosed.into());
                };
                if matches!(event, SessionEvent::Trend { .. }) && stopping.is_some() {
                    debug!("ignoring trend sample queued before disconnect");
                    continue;
                }
                reporter.event(&event)?;

                match event {
                    SessionEvent::Trend { state } => {
                        tally.record(state);
                        if let Some(limit) = max_samples && tally.total() >= limit.get() {
                            stopping = Some(StreamStopReason::SampleLimit);
                            if !request_disconnect(session, reporter).await? {
                                break StreamStopReason::SampleLimit;
                            }
                        }
                    }
                    SessionEvent::ConnectFailed { reason, .. } => {
                        return Err(anyhow!(
                            "connection to {} failed: {reason}",
                            device.display_name()
                        ));
                    }
                    SessionEvent::Disconnected { .. } => {
                        break stopping.unwrap_or(StreamStopReason::DeviceDisconnected);
                    }
                    _ => {}
                }
            }
        }
    };

    Ok(StreamSummary {
        device,
        samples: tally.total(),
        tally,
        stop_reason,
    })
}

async fn request_disconnect<W>(
    session: &SessionHandle,
    reporter: &mut Reporter<'_, W>,
) -> Result<bool>
where
    W: io::Write,
{
    let requested = session.disconnect().await?;
    if requested {
        reporter.progress("Disconnecting...")?;
    }
    Ok(requested)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn tally_counts_each_state_separately() {
        let mut tally = TrendTally::default();
        for state in [
            TrendState::Relaxing,
            TrendState::Relaxing,
            TrendState::Stressing,
            TrendState::Inactive,
        ] {
            tally.record(state);
        }

        assert_eq!(2, tally.count(TrendState::Relaxing));
        assert_eq!(1, tally.count(TrendState::Stressing));
        assert_eq!(0, tally.count(TrendState::Steady));
        assert_eq!(1, tally.count(TrendState::Inactive));
        assert_eq!(4, tally.total());
    }

    #[test]
    fn tally_total_matches_sum_of_states() {
        let mut tally = TrendTally::default();
        for state in TrendState::iter() {
            tally.record(state);
        }

        let summed: usize = TrendState::iter().map(|state| tally.count(state)).sum();
        assert_eq!(summed, tally.total());
    }

    #[test]
    fn stream_args_build_session_config() {
        let args =
            StreamArgs::new(NonZeroUsize::new(3)).with_connect_timeout(Duration::from_secs(5));

        let config = args.session_config();
        assert_eq!(Some(Duration::from_secs(5)), config.connect_timeout());
        assert_eq!(None, config.discovery_timeout());
    }
}
