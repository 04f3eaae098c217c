mod recording;
mod simulated;

use crate::session::{AnalyzerSample, DeviceId, DeviceInfo, TransportStatus};

pub use self::recording::RecordingTransport;
pub use self::simulated::{SampleFixture, ScanFixture, SimulatedTransport, SimulatorConfig};

/// Outbound requests the session makes of the wireless transport.
///
/// Every request is fire-and-forget: results arrive later as [`TransportEvent`]s.
/// Implementations must not block.
pub trait Transport: Send {
    /// Begins scanning for nearby devices.
    fn request_discovery(&self);

    /// Asks the transport to end the running scan.
    fn cancel_discovery(&self);

    /// Starts connecting to a discovered device.
    fn request_connect(&self, device: DeviceId);

    /// Closes the link to a device.
    fn request_disconnect(&self, device: DeviceId);

    /// Starts analyzer sample delivery from a connected device.
    fn request_start_streaming(&self, device: DeviceId);

    /// Resolves the transport's current record for a device.
    fn lookup_device(&self, device: DeviceId) -> Option<DeviceInfo>;
}

/// Events delivered by the transport into the session.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TransportEvent {
    /// The transport finished initialising.
    ManagerReady,
    /// Pairing with a device completed.
    Paired {
        status: TransportStatus,
        device: DeviceId,
    },
    /// A device was seen during a scan.
    DeviceFound(DeviceInfo),
    /// A scan ended, naturally or through cancellation.
    ScanComplete { count: usize },
    /// A connection attempt completed.
    Connected {
        status: TransportStatus,
        device: DeviceId,
    },
    /// A connection attempt or an established link failed.
    ConnectionError {
        status: TransportStatus,
        device: DeviceId,
    },
    /// A link closed.
    Disconnected {
        status: TransportStatus,
        device: DeviceId,
    },
    /// The transport reconnected automatically after the host resumed.
    Resumed { status: TransportStatus },
    /// The device analyzer produced output for one tick.
    AnalyzerSample {
        device: DeviceId,
        sample: AnalyzerSample,
    },
}

/// One outbound request, as captured by [`RecordingTransport`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TransportRequest {
    Discovery,
    CancelDiscovery,
    Connect(DeviceId),
    Disconnect(DeviceId),
    StartStreaming(DeviceId),
}
