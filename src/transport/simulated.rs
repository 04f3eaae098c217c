use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use bon::Builder;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Transport, TransportEvent};
use crate::error::FixtureError;
use crate::session::{AnalyzerSample, DeviceId, DeviceInfo, EventSender, TransportStatus};

const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(250);
/// Status reported when asked to connect to a device the simulator never advertised.
const UNKNOWN_DEVICE_STATUS: TransportStatus = TransportStatus::new(-2);

/// Parsed scan fixture records, in advertisement order.
#[derive(Debug, Clone, derive_more::Into)]
pub struct ScanFixture {
    devices: Vec<DeviceInfo>,
}

impl FromStr for ScanFixture {
    type Err = FixtureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() {
            return Err(FixtureError::EmptyFixture);
        }
        let devices = value
            .split(';')
            .map(parse_scan_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { devices })
    }
}

impl Default for ScanFixture {
    /// A single named device, `1|PIP`.
    fn default() -> Self {
        Self {
            devices: vec![DeviceInfo::new(DeviceId::new(1), Some("PIP".to_string()))],
        }
    }
}

/// Parsed analyzer sample fixtures, in delivery order.
#[derive(Debug, Clone, Default, derive_more::Into)]
pub struct SampleFixture {
    samples: Vec<AnalyzerSample>,
}

impl FromStr for SampleFixture {
    type Err = FixtureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() {
            return Ok(Self::default());
        }
        let samples = value
            .split(',')
            .map(parse_sample_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { samples })
    }
}

/// Settings for a [`SimulatedTransport`].
#[derive(Debug, Clone, Builder)]
pub struct SimulatorConfig {
    scan_fixture: ScanFixture,
    #[builder(default)]
    samples: SampleFixture,
    #[builder(default)]
    discovery_delay: Duration,
    #[builder(default = DEFAULT_SAMPLE_INTERVAL)]
    sample_interval: Duration,
    #[builder(default = TransportStatus::SUCCESS)]
    connect_status: TransportStatus,
}

/// Fixture-driven stand-in for a device transport.
///
/// Scans replay the scan fixture, connects answer with the configured status,
/// and streaming replays the sample fixture at a fixed interval until the
/// device is disconnected. Background work runs on the current tokio runtime.
#[derive(Debug)]
pub struct SimulatedTransport {
    config: SimulatorConfig,
    events: EventSender,
    scan: Mutex<Option<CancellationToken>>,
    stream: Mutex<Option<CancellationToken>>,
}

impl SimulatedTransport {
    /// Creates the simulator and announces that it is ready.
    #[must_use]
    pub fn new(config: SimulatorConfig, events: EventSender) -> Self {
        events.deliver(TransportEvent::ManagerReady);
        Self {
            config,
            events,
            scan: Mutex::new(None),
            stream: Mutex::new(None),
        }
    }

    fn known_device(&self, device: DeviceId) -> Option<&DeviceInfo> {
        self.config
            .scan_fixture
            .devices
            .iter()
            .find(|known| known.id() == device)
    }
}

impl Transport for SimulatedTransport {
    fn request_discovery(&self) {
        let cancel = CancellationToken::new();
        if let Some(previous) = replace_token(&self.scan, Some(cancel.clone())) {
            previous.cancel();
        }

        let devices = self.config.scan_fixture.devices.clone();
        let delay = self.config.discovery_delay;
        let events = self.events.clone();
        tokio::spawn(async move {
            let mut reported = 0usize;
            for device in devices {
                if !delay.is_zero() {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = sleep(delay) => {}
                    }
                }
                if cancel.is_cancelled() {
                    break;
                }
                events.deliver(TransportEvent::DeviceFound(device));
                reported += 1;
            }
            debug!(reported, "simulated scan finished");
            events.deliver(TransportEvent::ScanComplete { count: reported });
        });
    }

    fn cancel_discovery(&self) {
        if let Some(scan) = replace_token(&self.scan, None) {
            scan.cancel();
        }
    }

    fn request_connect(&self, device: DeviceId) {
        let event = if self.known_device(device).is_some() {
            TransportEvent::Connected {
                status: self.config.connect_status,
                device,
            }
        } else {
            TransportEvent::ConnectionError {
                status: UNKNOWN_DEVICE_STATUS,
                device,
            }
        };
        self.events.deliver(event);
    }

    fn request_disconnect(&self, device: DeviceId) {
        if let Some(stream) = replace_token(&self.stream, None) {
            stream.cancel();
        }
        self.events.deliver(TransportEvent::Disconnected {
            status: TransportStatus::SUCCESS,
            device,
        });
    }

    fn request_start_streaming(&self, device: DeviceId) {
        let cancel = CancellationToken::new();
        if let Some(previous) = replace_token(&self.stream, Some(cancel.clone())) {
            previous.cancel();
        }

        let samples = self.config.samples.samples.clone();
        let interval = self.config.sample_interval;
        let events = self.events.clone();
        info!(%device, sample_count = samples.len(), "simulated stream started");
        tokio::spawn(async move {
            for sample in samples {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    () = sleep(interval) => {}
                }
                events.deliver(TransportEvent::AnalyzerSample { device, sample });
            }
            debug!(%device, "simulated sample fixture exhausted");
        });
    }

    fn lookup_device(&self, device: DeviceId) -> Option<DeviceInfo> {
        self.known_device(device).cloned()
    }
}

fn replace_token(
    slot: &Mutex<Option<CancellationToken>>,
    token: Option<CancellationToken>,
) -> Option<CancellationToken> {
    let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, token)
}

fn parse_scan_record(raw_record: &str) -> Result<DeviceInfo, FixtureError> {
    let fields: Vec<&str> = raw_record.split('|').map(str::trim).collect();
    if fields.len() != 2 {
        return Err(FixtureError::InvalidRecordFieldCount);
    }
    if fields[0].is_empty() || fields[1].is_empty() {
        return Err(FixtureError::EmptyRecordField);
    }

    let id = DeviceId::new(fields[0].parse::<u32>()?);
    let name = if fields[1] == "-" {
        None
    } else {
        Some(fields[1].to_string())
    };
    Ok(DeviceInfo::new(id, name))
}

fn parse_sample_record(raw_record: &str) -> Result<AnalyzerSample, FixtureError> {
    let record = raw_record.trim();
    let Some((active, trend)) = record.split_once(':') else {
        return Err(FixtureError::InvalidSampleRecord {
            record: record.to_string(),
        });
    };
    let trend_value = trend.trim().parse::<i32>()?;
    match active.trim() {
        "1" => Ok(AnalyzerSample::active(trend_value)),
        "0" => Ok(AnalyzerSample::inactive(trend_value)),
        other => Err(FixtureError::InvalidActivityFlag {
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("7|Alpha", 1)]
    #[case("7|Alpha;9|-", 2)]
    fn scan_fixture_parses_records(#[case] fixture: &str, #[case] expected_count: usize) {
        let fixture: ScanFixture = fixture.parse().expect("fixture should parse");
        let devices: Vec<DeviceInfo> = fixture.into();
        assert_eq!(expected_count, devices.len());
    }

    #[test]
    fn default_scan_fixture_matches_documented_record() {
        let parsed: Vec<DeviceInfo> = "1|PIP"
            .parse::<ScanFixture>()
            .expect("record should parse")
            .into();
        let default: Vec<DeviceInfo> = ScanFixture::default().into();
        assert_eq!(parsed, default);
    }

    #[test]
    fn scan_fixture_dash_means_unnamed() {
        let device = parse_scan_record("9|-").expect("record should parse");
        assert_eq!(None, device.name());
    }

    #[rstest]
    #[case("", FixtureError::EmptyFixture)]
    #[case("7|Alpha|extra", FixtureError::InvalidRecordFieldCount)]
    #[case("7|", FixtureError::EmptyRecordField)]
    fn scan_fixture_rejects_malformed_input(#[case] fixture: &str, #[case] expected: FixtureError) {
        let error = fixture
            .parse::<ScanFixture>()
            .expect_err("fixture should be rejected");
        assert_eq!(expected.to_string(), error.to_string());
    }

    #[test]
    fn scan_fixture_rejects_non_numeric_id() {
        let result = "alpha|Alpha".parse::<ScanFixture>();
        assert_matches!(result, Err(FixtureError::InvalidNumber(_)));
    }

    #[test]
    fn sample_fixture_parses_activity_and_trend() {
        let fixture: SampleFixture = "1:1, 1:2,0:1,1:-5".parse().expect("samples should parse");
        let samples: Vec<AnalyzerSample> = fixture.into();
        assert_eq!(
            vec![
                AnalyzerSample::active(1),
                AnalyzerSample::active(2),
                AnalyzerSample::inactive(1),
                AnalyzerSample::active(-5),
            ],
            samples
        );
    }

    #[rstest]
    #[case("1")]
    #[case("2:1")]
    fn sample_fixture_rejects_malformed_records(#[case] fixture: &str) {
        let result = fixture.parse::<SampleFixture>();
        assert_matches!(
            result,
            Err(FixtureError::InvalidSampleRecord { .. } | FixtureError::InvalidActivityFlag { .. })
        );
    }
}
