use std::fmt::{self, Display, Formatter};

use crate::cli::stream::StreamSummary;
use crate::session::{DeviceInfo, SessionEvent, TrendState};

use super::painter::Painter;
use super::table::Table;

/// Renders one session event as a status line.
pub(crate) struct SessionEventView<'a> {
    event: &'a SessionEvent,
    painter: &'a Painter,
}

impl<'a> SessionEventView<'a> {
    pub(crate) fn new(event: &'a SessionEvent, painter: &'a Painter) -> Self {
        Self { event, painter }
    }
}

impl Display for SessionEventView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let painter = self.painter;
        match self.event {
            SessionEvent::Ready => write!(f, "{}", painter.success("Ready.")),
            SessionEvent::Discovered { device } => write!(
                f,
                "Discovered PIP: {} {}",
                painter.value(device.display_name()),
                painter.muted(format!("(id {})", device.id()))
            ),
            SessionEvent::DiscoveryComplete { found: true } => {
                write!(f, "{}", painter.success("Discovery complete."))
            }
            SessionEvent::DiscoveryComplete { found: false } => {
                write!(f, "{}", painter.warning("Discovery complete: no PIP found."))
            }
            SessionEvent::Connected { device } => write!(
                f,
                "{} {}",
                painter.success("Connected."),
                painter.muted(format!("(id {device})"))
            ),
            SessionEvent::ConnectFailed { device, reason } => write!(
                f,
                "{} {}",
                painter.warning("Connect failed:"),
                painter.muted(format!("{reason} (id {device})"))
            ),
            SessionEvent::Disconnected { status, .. } if status.is_success() => {
                write!(f, "{}", painter.success("Disconnected."))
            }
            SessionEvent::Disconnected { status, .. } => write!(
                f,
                "{} {}",
                painter.warning("Disconnected:"),
                painter.muted(format!("status {status}"))
            ),
            SessionEvent::Trend { state } => {
                write!(f, "Streaming: {}", painter.trend(*state, trend_label(*state)))
            }
        }
    }
}

/// Renders the devices collected by a scan.
pub(crate) struct DeviceListView<'a> {
    devices: &'a [DeviceInfo],
    painter: &'a Painter,
}

impl<'a> DeviceListView<'a> {
    pub(crate) fn new(devices: &'a [DeviceInfo], painter: &'a Painter) -> Self {
        Self { devices, painter }
    }
}

impl Display for DeviceListView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.devices.is_empty() {
            return write!(f, "{}", self.painter.warning("No PIP devices found."));
        }

        write!(f, "{}", self.painter.heading("Discovered devices:"))?;
        write!(f, "\n{}", Table::devices(self.painter, self.devices))
    }
}

/// Renders the end-of-stream summary.
pub(crate) struct StreamSummaryView<'a> {
    summary: &'a StreamSummary,
    painter: &'a Painter,
}

impl<'a> StreamSummaryView<'a> {
    pub(crate) fn new(summary: &'a StreamSummary, painter: &'a Painter) -> Self {
        Self { summary, painter }
    }
}

impl Display for StreamSummaryView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let painter = self.painter;
        let session = Table::key_value(
            painter,
            vec![
                (
                    "device",
                    format!(
                        "{} {}",
                        painter.value(self.summary.device.display_name()),
                        painter.muted(format!("(id {})", self.summary.device.id()))
                    ),
                ),
                ("samples", painter.value(self.summary.samples.to_string())),
                ("stopped", painter.value(self.summary.stop_reason.to_string())),
            ],
        );
        let tally = Table::tally(&self.summary.tally);

        write!(f, "{}", painter.heading("Stream summary:"))?;
        write!(f, "\n{session}")?;
        write!(f, "\n{tally}")
    }
}

pub(super) fn trend_label(state: TrendState) -> &'static str {
    match state {
        TrendState::Relaxing => "Relaxing",
        TrendState::Stressing => "Stressing",
        TrendState::Steady => "Steady",
        TrendState::Inactive => "Inactive",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::session::{ConnectFailure, DeviceId, TransportStatus};

    fn render(event: SessionEvent) -> String {
        let painter = Painter::new(false);
        SessionEventView::new(&event, &painter).to_string()
    }

    #[rstest]
    #[case::ready(SessionEvent::Ready, "Ready.")]
    #[case::discovered(
        SessionEvent::Discovered {
            device: DeviceInfo::new(DeviceId::new(7), Some("Alpha".into())),
        },
        "Discovered PIP: Alpha (id 7)"
    )]
    #[case::discovered_unnamed(
        SessionEvent::Discovered { device: DeviceInfo::new(DeviceId::new(9), None) },
        "Discovered PIP: Unknown PIP (id 9)"
    )]
    #[case::nothing_found(
        SessionEvent::DiscoveryComplete { found: false },
        "Discovery complete: no PIP found."
    )]
    #[case::connect_failed(
        SessionEvent::ConnectFailed {
            device: DeviceId::new(7),
            reason: ConnectFailure::Status(TransportStatus::new(-3)),
        },
        "Connect failed: status -3 (id 7)"
    )]
    #[case::timed_out(
        SessionEvent::ConnectFailed { device: DeviceId::new(7), reason: ConnectFailure::TimedOut },
        "Connect failed: timed out (id 7)"
    )]
    #[case::clean_disconnect(
        SessionEvent::Disconnected { device: DeviceId::new(7), status: TransportStatus::SUCCESS },
        "Disconnected."
    )]
    #[case::trend(SessionEvent::Trend { state: TrendState::Stressing }, "Streaming: Stressing")]
    fn event_lines_render_plain(#[case] event: SessionEvent, #[case] expected: &str) {
        assert_eq!(expected, render(event));
    }

    #[test]
    fn empty_device_list_renders_warning() {
        let painter = Painter::new(false);
        assert_eq!(
            "No PIP devices found.",
            DeviceListView::new(&[], &painter).to_string()
        );
    }
}
