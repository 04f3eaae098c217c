use std::sync::{Arc, Mutex, PoisonError};

use super::{Transport, TransportRequest};
use crate::session::{DeviceId, DeviceInfo};

/// Transport that records requests without acting on them.
///
/// Clones share the same request log, so a test can keep one clone while the
/// session owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    known_devices: Vec<DeviceInfo>,
    requests: Arc<Mutex<Vec<TransportRequest>>>,
}

impl RecordingTransport {
    /// Creates a recorder with no known devices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the devices answered by [`Transport::lookup_device`].
    #[must_use]
    pub fn with_known_devices(mut self, devices: impl IntoIterator<Item = DeviceInfo>) -> Self {
        self.known_devices = devices.into_iter().collect();
        self
    }

    /// Returns every request made so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many recorded requests equal `request`.
    #[must_use]
    pub fn count(&self, request: TransportRequest) -> usize {
        self.requests()
            .into_iter()
            .filter(|recorded| *recorded == request)
            .count()
    }

    fn record(&self, request: TransportRequest) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }
}

impl Transport for RecordingTransport {
    fn request_discovery(&self) {
        self.record(TransportRequest::Discovery);
    }

    fn cancel_discovery(&self) {
        self.record(TransportRequest::CancelDiscovery);
    }

    fn request_connect(&self, device: DeviceId) {
        self.record(TransportRequest::Connect(device));
    }

    fn request_disconnect(&self, device: DeviceId) {
        self.record(TransportRequest::Disconnect(device));
    }

    fn request_start_streaming(&self, device: DeviceId) {
        self.record(TransportRequest::StartStreaming(device));
    }

    fn lookup_device(&self, device: DeviceId) -> Option<DeviceInfo> {
        self.known_devices
            .iter()
            .find(|known| known.id() == device)
            .cloned()
    }
}
