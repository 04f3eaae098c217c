use serde::Serialize;
use serde_with::SerializeDisplay;
use strum_macros::{Display, EnumIter};

/// Name shown for devices that did not advertise one.
pub(crate) const UNKNOWN_DEVICE_NAME: &str = "Unknown PIP";

/// Opaque identifier assigned to a device by the transport layer.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
    Serialize,
)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Wraps a raw transport identifier.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

/// Identity and metadata of a discovered device.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DeviceInfo {
    id: DeviceId,
    name: Option<String>,
}

impl DeviceInfo {
    /// Creates a device record. Empty names are treated as absent.
    ///
    /// ```
    /// let info = pipstream::DeviceInfo::new(pipstream::DeviceId::new(7), Some("".into()));
    /// assert_eq!(None, info.name());
    /// assert_eq!("Unknown PIP", info.display_name());
    /// ```
    #[must_use]
    pub fn new(id: DeviceId, name: Option<String>) -> Self {
        Self {
            id,
            name: name.filter(|name| !name.is_empty()),
        }
    }

    /// Returns the transport-assigned identifier.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns the advertised name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the advertised name or a placeholder for unnamed devices.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(UNKNOWN_DEVICE_NAME)
    }
}

/// Lifecycle state of the single device session.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display, EnumIter, SerializeDisplay)]
pub enum ConnectionState {
    #[strum(to_string = "idle")]
    Idle,
    #[strum(to_string = "discovering")]
    Discovering,
    #[strum(to_string = "discovered")]
    Discovered,
    #[strum(to_string = "connecting")]
    Connecting,
    #[strum(to_string = "connected")]
    Connected,
    #[strum(to_string = "streaming")]
    Streaming,
    #[strum(to_string = "disconnecting")]
    Disconnecting,
    #[strum(to_string = "disconnected")]
    Disconnected,
    #[strum(to_string = "connect_failed")]
    ConnectFailed,
}

impl ConnectionState {
    /// Returns whether `connect` is accepted from this state.
    #[must_use]
    pub fn accepts_connect(self) -> bool {
        matches!(
            self,
            Self::Discovered | Self::ConnectFailed | Self::Disconnected
        )
    }

    /// Returns whether a device link is being established, held, or torn down.
    #[must_use]
    pub fn is_linked(self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::Connected | Self::Streaming | Self::Disconnecting
        )
    }
}

/// Status code reported by the transport alongside connection events.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
    Serialize,
)]
#[serde(transparent)]
pub struct TransportStatus(i32);

impl TransportStatus {
    /// Status reported for successful operations.
    pub const SUCCESS: Self = Self(0);

    /// Wraps a raw transport status code.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns whether the status reports success.
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

/// One analyzer output record for a sampling tick.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct AnalyzerSample {
    /// Signed trend classification code from the device analyzer.
    pub trend_value: i32,
    /// Whether the device detects that it is currently held.
    pub active: bool,
}

impl AnalyzerSample {
    /// Creates a sample taken while the device is held.
    #[must_use]
    pub const fn active(trend_value: i32) -> Self {
        Self {
            trend_value,
            active: true,
        }
    }

    /// Creates a sample taken while the device is not held.
    #[must_use]
    pub const fn inactive(trend_value: i32) -> Self {
        Self {
            trend_value,
            active: false,
        }
    }
}

/// Semantic classification of one analyzer sample.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display, EnumIter, SerializeDisplay)]
pub enum TrendState {
    #[strum(to_string = "relaxing")]
    Relaxing,
    #[strum(to_string = "stressing")]
    Stressing,
    #[strum(to_string = "steady")]
    Steady,
    #[strum(to_string = "inactive")]
    Inactive,
}

/// Why a connection attempt ended in `ConnectFailed`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case", tag = "kind", content = "status")]
pub enum ConnectFailure {
    /// The transport reported a failing status.
    #[display("status {_0}")]
    Status(TransportStatus),
    /// The attempt exceeded the configured connect timeout.
    #[display("timed out")]
    TimedOut,
}

/// Simplified events republished to the session collaborator.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum SessionEvent {
    /// The transport finished initialising and accepts requests.
    Ready,
    /// A device was added to the discovery results.
    Discovered { device: DeviceInfo },
    /// A scan ended; `found` is false when nothing was discovered.
    DiscoveryComplete { found: bool },
    /// The device connected and streaming was requested.
    Connected { device: DeviceId },
    /// Connecting failed or an established link reported an error.
    ConnectFailed {
        device: DeviceId,
        reason: ConnectFailure,
    },
    /// The device link closed.
    Disconnected {
        device: DeviceId,
        status: TransportStatus,
    },
    /// One streamed sample was classified.
    Trend { state: TrendState },
}
