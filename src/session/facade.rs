use serde::Serialize;
use tracing::{debug, info, instrument, trace};

use super::connection::ConnectionController;
use super::discovery::DiscoverySession;
use super::interpreter::StreamInterpreter;
use super::model::{AnalyzerSample, ConnectionState, DeviceId, DeviceInfo, SessionEvent};
use super::registry::DeviceRegistry;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::transport::{Transport, TransportEvent};

/// Point-in-time view of a session.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: ConnectionState,
    pub devices: Vec<DeviceInfo>,
    pub active_device: Option<DeviceInfo>,
}

/// Single entry point for one device session.
///
/// The facade is synchronous: callers feed it transport events one at a time
/// and forward the returned [`SessionEvent`]s to whoever presents them. See
/// [`crate::start_session`] for an actor that does this over channels.
#[derive(Debug)]
pub struct SessionFacade<T> {
    transport: T,
    discovery: DiscoverySession,
    controller: ConnectionController,
    interpreter: StreamInterpreter,
    active_device: Option<DeviceInfo>,
}

impl<T: Transport> SessionFacade<T> {
    /// Creates an idle session over `transport`.
    #[must_use]
    pub fn new(transport: T, config: &SessionConfig) -> Self {
        Self {
            transport,
            discovery: DiscoverySession::new(config.discovery_policy()),
            controller: ConnectionController::default(),
            interpreter: StreamInterpreter::new(config.trend_codes()),
            active_device: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.controller.state()
    }

    /// Returns the results of the latest discovery.
    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        self.discovery.registry()
    }

    /// Returns the device selected by the latest successful `connect_to_discovered`.
    #[must_use]
    pub fn active_device(&self) -> Option<&DeviceInfo> {
        self.active_device.as_ref()
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            devices: self.registry().devices().to_vec(),
            active_device: self.active_device.clone(),
        }
    }

    /// Starts a fresh discovery.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyInProgress`] while a scan is running and
    /// [`SessionError::InvalidState`] while a device link is active.
    #[instrument(skip(self), level = "info", fields(state = %self.state()))]
    pub fn begin_discovery(&mut self) -> Result<(), SessionError> {
        self.discovery.start(&mut self.controller, &self.transport)?;
        self.active_device = None;
        Ok(())
    }

    /// Stops the running scan, if any.
    pub fn cancel_discovery(&mut self) -> bool {
        self.discovery.cancel(&self.transport)
    }

    /// Connects to the first discovered device.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingDiscovered`] when the registry is empty
    /// and [`SessionError::InvalidState`] when the session cannot connect now.
    #[instrument(skip(self), level = "info", fields(state = %self.state()))]
    pub fn connect_to_discovered(&mut self) -> Result<DeviceInfo, SessionError> {
        let Some(first) = self.registry().first().cloned() else {
            return Err(SessionError::NothingDiscovered);
        };
        let device = match self.transport.lookup_device(first.id()) {
            Some(current) => current,
            None => {
                debug!(device = %first.id(), "transport has no record, using discovery result");
                first
            }
        };

        self.controller.connect(device.id(), &self.transport)?;
        info!(device = %device.id(), name = device.display_name(), "connecting");
        self.active_device = Some(device.clone());
        Ok(device)
    }

    /// Closes the current link. Returns `false` when there was nothing to close.
    #[instrument(skip(self), level = "info", fields(state = %self.state()))]
    pub fn disconnect(&mut self) -> bool {
        self.controller.disconnect(&self.transport)
    }

    /// Applies one transport event and returns what the collaborator should see.
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> Option<SessionEvent> {
        match event {
            TransportEvent::ManagerReady => {
                info!("transport ready");
                Some(SessionEvent::Ready)
            }
            TransportEvent::Paired { status, device } => {
                info!(%device, %status, "pairing completed");
                None
            }
            TransportEvent::DeviceFound(device) => self
                .discovery
                .on_device_found(device, &mut self.controller, &self.transport)
                .map(|device| SessionEvent::Discovered { device }),
            TransportEvent::ScanComplete { count } => self
                .discovery
                .on_scan_complete(count, &mut self.controller)
                .map(|found| SessionEvent::DiscoveryComplete { found }),
            TransportEvent::Connected { status, device } => {
                self.controller
                    .on_connected(status, device, &self.transport)
            }
            TransportEvent::ConnectionError { status, device } => {
                self.controller.on_connection_error(status, device)
            }
            TransportEvent::Disconnected { status, device } => {
                self.controller.on_disconnected(status, device)
            }
            TransportEvent::Resumed { status } => {
                self.controller.on_resumed(status, &self.transport)
            }
            TransportEvent::AnalyzerSample { device, sample } => self.on_sample(device, sample),
        }
    }

    /// Releases transport resources: stops scanning and closes the link.
    pub fn teardown(&mut self) {
        let cancelled = self.cancel_discovery();
        let disconnected = self.disconnect();
        debug!(cancelled, disconnected, "session torn down");
    }

    pub(crate) fn discovery_timed_out(&mut self) {
        if self.cancel_discovery() {
            info!("discovery timed out, cancelling scan");
        }
    }

    pub(crate) fn connect_timed_out(&mut self) -> Option<SessionEvent> {
        self.controller.abort_connect(&self.transport)
    }

    fn on_sample(&self, device: DeviceId, sample: AnalyzerSample) -> Option<SessionEvent> {
        if self.state() != ConnectionState::Streaming || self.controller.device() != Some(device) {
            trace!(%device, state = %self.state(), "dropping sample outside the stream");
            return None;
        }
        Some(SessionEvent::Trend {
            state: self.interpreter.classify(sample),
        })
    }
}
